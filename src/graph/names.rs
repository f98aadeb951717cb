//! Canonical Naming
//!
//! Turns schema keys, property names and literal values into the IR's
//! canonical PascalCase identifiers. Backends derive their own spellings
//! from these names; nothing here is target-specific.

/// Lowercase word -> canonical acronym spelling
const ACRONYMS: &[(&str, &str)] = &[
    ("api", "API"),
    ("ascii", "ASCII"),
    ("cors", "CORS"),
    ("cpu", "CPU"),
    ("csrf", "CSRF"),
    ("css", "CSS"),
    ("db", "DB"),
    ("dns", "DNS"),
    ("ftp", "FTP"),
    ("gpu", "GPU"),
    ("grpc", "GRPC"),
    ("html", "HTML"),
    ("http", "HTTP"),
    ("https", "HTTPS"),
    ("id", "ID"),
    ("imap", "IMAP"),
    ("io", "IO"),
    ("ip", "IP"),
    ("json", "JSON"),
    ("jwt", "JWT"),
    ("oauth", "OAuth"),
    ("os", "OS"),
    ("pop", "POP"),
    ("ram", "RAM"),
    ("rest", "REST"),
    ("rpc", "RPC"),
    ("smtp", "SMTP"),
    ("sql", "SQL"),
    ("ssh", "SSH"),
    ("ssl", "SSL"),
    ("tcp", "TCP"),
    ("tls", "TLS"),
    ("udp", "UDP"),
    ("ui", "UI"),
    ("uri", "URI"),
    ("url", "URL"),
    ("utf", "UTF"),
    ("uuid", "UUID"),
    ("ux", "UX"),
    ("xml", "XML"),
    ("xss", "XSS"),
];

fn acronym(word: &str) -> Option<&'static str> {
    let lower = word.to_ascii_lowercase();
    ACRONYMS
        .binary_search_by(|(k, _)| k.cmp(&lower.as_str()))
        .ok()
        .map(|i| ACRONYMS[i].1)
}

/// Split on delimiters and lower->upper case transitions.
///
/// Any character that is not ASCII alphanumeric acts as a delimiter.
pub fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }

        if c.is_ascii_uppercase() && prev.is_some_and(|p| p.is_ascii_lowercase()) && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        current.push(c);
        prev = Some(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Convert to PascalCase, spelling known acronyms in capitals
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|word| match acronym(word) {
            Some(a) => a.to_string(),
            None => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        let mut out = first.to_ascii_uppercase().to_string();
                        out.push_str(&chars.as_str().to_ascii_lowercase());
                        out
                    }
                    None => String::new(),
                }
            }
        })
        .collect()
}

/// Convert to CONSTANT_CASE
pub fn to_constant_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn is_pascal_case(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Canonical type name for a schema key, property or literal.
///
/// Names already in PascalCase are kept verbatim so existing acronym
/// spellings survive (`RPCRequest` stays `RPCRequest`).
pub fn symbol_name(s: &str) -> String {
    let trimmed = s.trim_start_matches(['$', '@', '#']);
    if is_pascal_case(trimmed) {
        return trimmed.to_string();
    }

    let name = to_pascal_case(trimmed);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("N{}", name)
    } else {
        name
    }
}
