//! Per-attempt argument bundles and the escalation table.

use super::browser::BrowserId;

/// Arguments that make the tool itself retry transient network hiccups.
const RESILIENCE_ARGS: [&str; 6] = [
    "--retries",
    "3",
    "--fragment-retries",
    "5",
    "--extractor-retries",
    "3",
];

/// Client identity the tool presents to the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Client {
    Ios,
    Tv,
    Web,
}

impl Client {
    fn extractor_arg(self) -> &'static str {
        match self {
            Client::Ios => "youtube:player_client=ios",
            Client::Tv => "youtube:player_client=tv",
            Client::Web => "youtube:player_client=web",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Client::Ios => "iOS client",
            Client::Tv => "TV client",
            Client::Web => "Web client",
        }
    }
}

/// One row of the escalation table.
#[derive(Debug, Clone, Copy)]
struct Row {
    cookies: bool,
    client: Option<Client>,
    force_ipv4: bool,
}

const PLAIN: Row = Row {
    cookies: false,
    client: None,
    force_ipv4: false,
};

const fn row(cookies: bool, client: Client, force_ipv4: bool) -> Row {
    Row {
        cookies,
        client: Some(client),
        force_ipv4,
    }
}

/// Cookie rows are skipped without a browser; those attempts take the next
/// cookie-free row instead (TV over IPv4 up to 7, Web after).
fn row_for(attempt: u32, has_browser: bool) -> Row {
    match attempt {
        0..=1 => PLAIN,
        2..=3 if has_browser => row(true, Client::Ios, true),
        4..=5 if has_browser => row(true, Client::Tv, true),
        2..=7 => row(false, Client::Tv, true),
        8..=9 if has_browser => row(true, Client::Web, false),
        _ => row(false, Client::Web, false),
    }
}

/// Command-line argument groups for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStrategy {
    pub cookie_args: Vec<String>,
    pub client_args: Vec<String>,
    pub network_args: Vec<String>,
    pub bot_bypass_args: Vec<String>,
    pub retry_args: Vec<String>,
    pub description: String,
}

impl AuthStrategy {
    /// All groups flattened in a stable order.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.cookie_args
            .iter()
            .chain(&self.client_args)
            .chain(&self.network_args)
            .chain(&self.bot_bypass_args)
            .chain(&self.retry_args)
            .map(String::as_str)
    }
}

/// Builds the strategy for `attempt` (1-based; 0 is treated as 1).
///
/// Pure: the same inputs always produce the same strategy.
pub fn build_strategy(
    attempt: u32,
    browser: Option<BrowserId>,
    bot_bypass_token: Option<&str>,
) -> AuthStrategy {
    let row = row_for(attempt, browser.is_some());
    let cookie_browser = browser.filter(|_| row.cookies);

    let cookie_args = match cookie_browser {
        Some(b) => vec!["--cookies-from-browser".to_string(), b.as_str().to_string()],
        None => Vec::new(),
    };
    let client_args = match row.client {
        Some(c) => vec!["--extractor-args".to_string(), c.extractor_arg().to_string()],
        None => Vec::new(),
    };
    let network_args = if row.force_ipv4 {
        vec!["--force-ipv4".to_string()]
    } else {
        Vec::new()
    };
    let bot_bypass_args = match bot_bypass_token {
        Some(token) => vec![
            "--extractor-args".to_string(),
            format!("youtube:po_token={}", token),
        ],
        None => Vec::new(),
    };

    let mut description = match (cookie_browser, row.client) {
        (None, None) => "Default (no special client)".to_string(),
        (Some(b), Some(c)) => format!("Browser cookies ({}) + {}", b.as_str(), c.label()),
        (Some(b), None) => format!("Browser cookies ({})", b.as_str()),
        (None, Some(c)) => format!("{} (no cookies)", c.label()),
    };
    if row.force_ipv4 {
        description.push_str(" over IPv4");
    }
    if bot_bypass_token.is_some() {
        description.push_str(" + PO token");
    }

    AuthStrategy {
        cookie_args,
        client_args,
        network_args,
        bot_bypass_args,
        retry_args: RESILIENCE_ARGS.iter().map(|s| s.to_string()).collect(),
        description,
    }
}
