//! Parsing of the interactive client's input lines.

use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  signup <email> <password> <full name>
  login <email> <password>
  post <text>
  photo <path> [text]
  feed
  logout
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        full_name: String,
    },
    Login {
        email: String,
        password: String,
    },
    Post(String),
    Photo {
        path: PathBuf,
        text: String,
    },
    Feed,
    Logout,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb {
            "signup" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                match (parts.next(), parts.next(), parts.next().map(str::trim)) {
                    (Some(email), Some(password), Some(full_name)) if !full_name.is_empty() => {
                        Command::SignUp {
                            email: email.to_string(),
                            password: password.to_string(),
                            full_name: full_name.to_string(),
                        }
                    }
                    _ => return Err("usage: signup <email> <password> <full name>".to_string()),
                }
            }
            "login" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                match parts.as_slice() {
                    [email, password] => Command::Login {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err("usage: login <email> <password>".to_string()),
                }
            }
            // Empty text is passed through; the submitter rejects it.
            "post" => Command::Post(rest.to_string()),
            "photo" => {
                if rest.is_empty() {
                    return Err("usage: photo <path> [text]".to_string());
                }
                let (path, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Command::Photo {
                    path: PathBuf::from(path),
                    text: text.trim().to_string(),
                }
            }
            "feed" => Command::Feed,
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command `{other}`; type `help`")),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_keeps_spaces_in_name() {
        let command = Command::parse("signup ada@example.com hunter22 Ada  King Lovelace").unwrap();
        assert_eq!(
            command,
            Some(Command::SignUp {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
                full_name: "Ada  King Lovelace".to_string(),
            })
        );
    }

    #[test]
    fn test_signup_requires_name() {
        assert!(Command::parse("signup ada@example.com hunter22").is_err());
    }

    #[test]
    fn test_login() {
        assert_eq!(
            Command::parse("  login ada@example.com hunter22 ").unwrap(),
            Some(Command::Login {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
            })
        );
        assert!(Command::parse("login ada@example.com").is_err());
    }

    #[test]
    fn test_post_text_is_kept_verbatim() {
        assert_eq!(
            Command::parse("post Hello,   world").unwrap(),
            Some(Command::Post("Hello,   world".to_string()))
        );
        assert_eq!(Command::parse("post").unwrap(), Some(Command::Post(String::new())));
    }

    #[test]
    fn test_photo_with_and_without_caption() {
        assert_eq!(
            Command::parse("photo ./cat.png look at him").unwrap(),
            Some(Command::Photo {
                path: PathBuf::from("./cat.png"),
                text: "look at him".to_string(),
            })
        );
        assert_eq!(
            Command::parse("photo cat.png").unwrap(),
            Some(Command::Photo {
                path: PathBuf::from("cat.png"),
                text: String::new(),
            })
        );
        assert!(Command::parse("photo").is_err());
    }

    #[test]
    fn test_blank_and_unknown() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(Command::parse("like 42").unwrap_err().contains("unknown command"));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }
}
