//! SMTP response parsing.

use crate::error::{ClientError, Result};

/// One line of a (possibly multi-line) SMTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    /// The status code (e.g. 220, 250, 550).
    pub code: u16,
    /// Whether this line terminates the response (space separator rather
    /// than a dash).
    pub is_last: bool,
    /// The text following the status code.
    pub message: String,
}

/// A complete SMTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The status code shared by every line of the response.
    pub code: u16,
    /// The text of each line, in order.
    pub lines: Vec<String>,
}

impl Response {
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// All line texts joined with newlines.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// 4xx or 5xx.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.code >= 400 && self.code < 600
    }

    /// Parses one response line (`250-EXT` or `250 OK`).
    pub fn parse_line(line: &str) -> Result<ResponseLine> {
        if line.len() < 3 {
            return Err(ClientError::ParseError(format!(
                "response line too short: '{line}'"
            )));
        }

        let code = line[..3]
            .parse::<u16>()
            .map_err(|_| ClientError::ParseError(format!("invalid status code in '{line}'")))?;

        let (is_last, message) = match line.as_bytes().get(3) {
            None => (true, ""),
            Some(b' ') => (true, line.get(4..).unwrap_or("")),
            Some(b'-') => (false, line.get(4..).unwrap_or("")),
            Some(_) => {
                return Err(ClientError::ParseError(format!(
                    "invalid separator in response line '{line}'"
                )));
            }
        };

        Ok(ResponseLine {
            code,
            is_last,
            message: message.to_string(),
        })
    }

    /// Tries to parse a complete response from the front of `buffer`.
    ///
    /// Returns `None` when more data is needed, otherwise the response and
    /// the number of bytes consumed.
    pub fn parse(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let text = std::str::from_utf8(buffer)?;

        let mut lines = Vec::new();
        let mut code = None;
        let mut consumed = 0;

        loop {
            let rest = &text[consumed..];
            let Some(end) = rest.find('\n') else {
                // No full line left in the buffer.
                return Ok(None);
            };

            let line = rest[..end].trim_end_matches('\r');
            consumed += end + 1;

            if line.is_empty() {
                continue;
            }

            let parsed = Self::parse_line(line)?;
            match code {
                None => code = Some(parsed.code),
                Some(code) if code != parsed.code => {
                    return Err(ClientError::ParseError(format!(
                        "status code changed mid-response: {code} then {}",
                        parsed.code
                    )));
                }
                Some(_) => {}
            }

            lines.push(parsed.message);

            if parsed.is_last {
                let Some(code) = code else { break };
                return Ok(Some((Self::new(code, lines), consumed)));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line() {
        assert_eq!(
            Response::parse_line("220 mail.example.com ESMTP").unwrap(),
            ResponseLine {
                code: 220,
                is_last: true,
                message: "mail.example.com ESMTP".to_string(),
            }
        );
    }

    #[test]
    fn dash_marks_continuation() {
        let line = Response::parse_line("250-STARTTLS").unwrap();
        assert!(!line.is_last);
        assert_eq!(line.message, "STARTTLS");
    }

    #[test]
    fn parses_complete_response() {
        let (response, consumed) = Response::parse(b"250 OK\r\n").unwrap().unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(response.lines, vec!["OK"]);
        assert_eq!(consumed, 8);
    }

    #[test]
    fn parses_multi_line_response() {
        let data = b"250-mail.example.com\r\n250-STARTTLS\r\n250 AUTH PLAIN LOGIN\r\n";
        let (response, consumed) = Response::parse(data).unwrap().unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(
            response.lines,
            vec!["mail.example.com", "STARTTLS", "AUTH PLAIN LOGIN"]
        );
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn incomplete_response_needs_more_data() {
        assert!(Response::parse(b"250-mail.example.com\r\n250-ST").unwrap().is_none());
        assert!(Response::parse(b"25").unwrap().is_none());
    }

    #[test]
    fn code_change_mid_response_is_malformed() {
        assert!(Response::parse(b"250-one\r\n550 two\r\n").is_err());
    }

    #[test]
    fn classifies_codes() {
        assert!(Response::new(250, vec![]).is_success());
        assert!(!Response::new(250, vec![]).is_error());
        assert!(Response::new(454, vec![]).is_error());
        assert!(Response::new(550, vec![]).is_error());
    }
}
