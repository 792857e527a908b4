//! Extraction of typed records from admin-surface pages.
//!
//! This is the only module that knows the markup of the remote host. Every page is
//! expected to carry a `.list` container; without it the whole read fails with
//! [`ParseError::MissingMarker`]. Individual entries that don't match their pattern
//! are skipped with a warning, so a successful parse may be a partial list.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::warn;

use crate::error::ParseError;
use crate::protocol::{AccessToken, ClientName, ClientScope, Username};

/// Container every list page renders its entries into
pub const LIST_MARKER: &str = ".list";

const DELETE_LABEL: &str = "Delete";

static LIST: OnceLock<Selector> = OnceLock::new();
static LIST_ITEM: OnceLock<Selector> = OnceLock::new();
static TOKEN_SPAN: OnceLock<Selector> = OnceLock::new();
static CLIENT_SPAN: OnceLock<Selector> = OnceLock::new();

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();
static CLIENT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn selector(cell: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector is valid"))
}

fn pattern(cell: &'static OnceLock<Regex>, re: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(re).expect("static pattern is valid"))
}

/// A tunnel client as listed on the clients page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    pub name: ClientName,
    /// `None` when the entry carries no `(Owner: ...)` suffix
    pub owner: Option<Username>,
}

/// One line of the tokens page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub token: AccessToken,
    pub owner: Username,
    pub scope: ClientScope,
}

/// Tokens keyed by owner.
///
/// The remote host allows several tokens per user; only the first listed one is
/// kept per owner; the rest end up in [`TokenTable::duplicates`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenTable {
    records: BTreeMap<Username, TokenRecord>,
    duplicates: Vec<TokenRecord>,
    skipped: usize,
}

impl TokenTable {
    pub fn get(&self, owner: &str) -> Option<&TokenRecord> {
        self.records.get(owner)
    }

    pub fn records(&self) -> impl Iterator<Item = &TokenRecord> {
        self.records.values()
    }

    pub fn duplicates(&self) -> &[TokenRecord] {
        &self.duplicates
    }

    /// Entries that did not match the token pattern
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: TokenRecord) {
        if self.records.contains_key(&record.owner) {
            warn!("Token for '{}' already exists, keeping the first", record.owner);
            self.duplicates.push(record);
        } else {
            self.records.insert(record.owner.clone(), record);
        }
    }
}

fn parse_page(body: &str, page: &'static str) -> Result<Html, ParseError> {
    let document = Html::parse_document(body);

    if document.select(selector(&LIST, LIST_MARKER)).next().is_none() {
        return Err(ParseError::MissingMarker {
            page,
            marker: LIST_MARKER,
        });
    }

    Ok(document)
}

/// Collapse all runs of whitespace in an element's text to single spaces
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Usernames from the users page
pub fn parse_users(body: &str) -> Result<Vec<Username>, ParseError> {
    let document = parse_page(body, "users")?;

    let users = document
        .select(selector(&LIST_ITEM, "div.list-item"))
        .filter_map(|item| {
            // The entry's own text comes first; the delete button label follows it
            item.text()
                .map(str::trim)
                .find(|text| !text.is_empty() && *text != DELETE_LABEL)
                .map(Username::from)
        })
        .collect();

    Ok(users)
}

/// Client entries from the clients page
pub fn parse_clients(body: &str) -> Result<Vec<ClientRecord>, ParseError> {
    let document = parse_page(body, "clients")?;
    let re = pattern(&CLIENT_PATTERN, r"^(?P<name>.+?) \(Owner: (?P<owner>[^)]*)\)$");

    let mut clients = Vec::new();

    for span in document.select(selector(&CLIENT_SPAN, "span.client")) {
        let text = normalized_text(span);
        if text.is_empty() {
            continue;
        }

        let record = match re.captures(&text) {
            Some(caps) => ClientRecord {
                name: ClientName::from(&caps["name"]),
                owner: Some(Username::from(&caps["owner"])),
            },
            None => ClientRecord {
                name: ClientName::from(text.as_str()),
                owner: None,
            },
        };
        clients.push(record);
    }

    Ok(clients)
}

/// Token table from the tokens page
pub fn parse_tokens(body: &str) -> Result<TokenTable, ParseError> {
    let document = parse_page(body, "tokens")?;
    let re = pattern(
        &TOKEN_PATTERN,
        r"^(?P<token>\S+) \(Owner: (?P<owner>[^)]*)\) \(Client: (?P<client>[^)]*)\)$",
    );

    let mut table = TokenTable::default();

    for span in document.select(selector(&TOKEN_SPAN, "span.token")) {
        let text = normalized_text(span);
        let Some(caps) = re.captures(&text) else {
            warn!("Skipping unrecognized token entry: {:?}", text);
            table.skipped += 1;
            continue;
        };

        table.insert(TokenRecord {
            token: AccessToken::from(&caps["token"]),
            owner: Username::from(&caps["owner"]),
            scope: ClientScope::from(caps["client"].to_string()),
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS_PAGE: &str = include_str!("../tests/fixtures/users.html");
    const TOKENS_PAGE: &str = include_str!("../tests/fixtures/tokens.html");
    const CLIENTS_PAGE: &str = include_str!("../tests/fixtures/clients.html");
    const LOGIN_PAGE: &str = include_str!("../tests/fixtures/login.html");

    #[test]
    fn test_parse_users_fixture() {
        let users = parse_users(USERS_PAGE).unwrap();
        assert_eq!(
            users,
            vec![
                Username::from("admin"),
                Username::from("alice1"),
                Username::from("bobbob")
            ]
        );
    }

    #[test]
    fn test_parse_users_empty_list() {
        let users = parse_users("<div class='list'></div>").unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            parse_users(LOGIN_PAGE),
            Err(ParseError::MissingMarker {
                page: "users",
                marker: LIST_MARKER
            })
        );
        assert!(parse_tokens("").is_err());
        assert!(parse_clients("<p>oops</p>").is_err());
    }

    #[test]
    fn test_parse_tokens_fixture() {
        let table = parse_tokens(TOKENS_PAGE).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.skipped(), 1);

        let alice = table.get("alice1").unwrap();
        assert_eq!(alice.token, AccessToken::from("tok123"));
        assert_eq!(alice.scope, ClientScope::Any);

        // Second alice1 token is retained as a duplicate, first one wins
        assert_eq!(table.duplicates().len(), 1);
        assert_eq!(table.duplicates()[0].token, AccessToken::from("tok456"));

        let bob = table.get("bobbob").unwrap();
        assert_eq!(bob.scope, ClientScope::Client(ClientName::from("desktop")));
    }

    #[test]
    fn test_parse_tokens_plain_line() {
        let body = "<div class='list'><span class='token'>tok123 (Owner: alice1) (Client: any)</span></div>";
        let table = parse_tokens(body).unwrap();
        assert_eq!(
            table.get("alice1").map(|r| r.token.as_str()),
            Some("tok123")
        );
        assert!(table.duplicates().is_empty());
    }

    #[test]
    fn test_parse_tokens_blank_client_is_any() {
        let body = "<div class='list'><span class='token'>tok789 (Owner: carol) (Client: )</span></div>";
        let table = parse_tokens(body).unwrap();
        assert_eq!(table.get("carol").map(|r| &r.scope), Some(&ClientScope::Any));
        assert_eq!(table.skipped(), 0);
    }

    #[test]
    fn test_duplicate_token_logs_once() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let table = tracing::subscriber::with_default(subscriber, || parse_tokens(TOKENS_PAGE)).unwrap();
        assert_eq!(table.duplicates().len(), 1);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let diagnostics: Vec<_> = output.lines().filter(|l| l.contains("already exists")).collect();
        assert_eq!(diagnostics.len(), 1, "{}", output);
        assert!(diagnostics[0].contains("WARN"));
        assert!(diagnostics[0].contains("alice1"));
    }

    #[test]
    fn test_parse_clients_fixture() {
        let clients = parse_clients(CLIENTS_PAGE).unwrap();

        assert_eq!(clients.len(), 3);
        assert_eq!(clients[0].name, ClientName::from("laptop"));
        assert_eq!(clients[0].owner, Some(Username::from("alice1")));
        assert_eq!(clients[1].name, ClientName::from("raspberry-pi"));
        assert_eq!(clients[2].owner, Some(Username::from("bobbob")));
    }

    #[test]
    fn test_parse_clients_without_owner() {
        let body = "<div class='list'><span class='client'> orphan </span></div>";
        let clients = parse_clients(body).unwrap();
        assert_eq!(
            clients,
            vec![ClientRecord {
                name: ClientName::from("orphan"),
                owner: None
            }]
        );
    }
}
