//! Answers svn's interactive prompts on a remote session.
//!
//! Classification is pure ([`PromptClassifier::classify`]); replying and
//! logging happen in [`SessionHandler::apply`].

use regex::Regex;
use tracing::warn;

use crate::common::error::DeployError;
use crate::common::result::DeployResult;
use crate::domain::entities::RepositoryConfig;
use crate::domain::value_objects::StreamKind;
use crate::infrastructure::logging::{stream_prefix, PrefixLogger};
use crate::infrastructure::remote::{Channel, LineHandler};

/// What to send back for a recognized prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Password,
    Yes,
    Passphrase,
    AcceptTemporarily,
}

/// Reaction to one output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Nothing to answer
    PassThrough,
    /// Narrate, then reply
    Respond {
        narration: &'static str,
        reply: Reply,
    },
    /// svn cannot continue; the entry named had its directory replaced
    Fatal { entry: String },
}

/// Prompt patterns, checked in order; the first match wins
#[derive(Debug, Clone)]
pub struct PromptClassifier {
    password: Regex,
    host_key: Regex,
    passphrase: Regex,
    certificate: Regex,
    replaced_directory: Regex,
}

impl PromptClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            password: Regex::new(r"(?i)\bpassword.*:")?,
            host_key: Regex::new(r"(?i)\(yes/no\)")?,
            passphrase: Regex::new(r"(?i)passphrase")?,
            certificate: Regex::new(r"(?i)accept \(t\)emporarily")?,
            replaced_directory: Regex::new(r"The entry '([^']+)' is no longer a directory")?,
        })
    }

    pub fn classify(&self, line: &str) -> SessionAction {
        if self.password.is_match(line) {
            return SessionAction::Respond {
                narration: "subversion is asking for a password",
                reply: Reply::Password,
            };
        }
        if self.host_key.is_match(line) {
            return SessionAction::Respond {
                narration: "subversion is asking whether to connect or not",
                reply: Reply::Yes,
            };
        }
        if self.passphrase.is_match(line) {
            return SessionAction::Respond {
                narration: "subversion needs your key's passphrase",
                reply: Reply::Passphrase,
            };
        }
        if self.certificate.is_match(line) {
            return SessionAction::Respond {
                narration: "accepting certificate temporarily",
                reply: Reply::AcceptTemporarily,
            };
        }
        if let Some(captures) = self.replaced_directory.captures(line) {
            return SessionAction::Fatal {
                entry: captures[1].to_string(),
            };
        }
        SessionAction::PassThrough
    }
}

/// Secrets a session may be asked for
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCredentials<'a> {
    pub password: Option<&'a str>,
    pub passphrase: Option<&'a str>,
}

impl<'a> SessionCredentials<'a> {
    pub fn from_config(config: &'a RepositoryConfig) -> Self {
        Self {
            password: config.svn_password(),
            passphrase: config.svn_passphrase(),
        }
    }
}

impl std::fmt::Debug for SessionCredentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("password", &self.password.map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.map(|_| "<redacted>"))
            .finish()
    }
}

/// [`LineHandler`] bound to one remote svn command
pub struct SessionHandler<'a> {
    classifier: PromptClassifier,
    credentials: SessionCredentials<'a>,
    logger: &'a dyn PrefixLogger,
}

impl<'a> SessionHandler<'a> {
    pub fn new(
        classifier: PromptClassifier,
        credentials: SessionCredentials<'a>,
        logger: &'a dyn PrefixLogger,
    ) -> Self {
        Self {
            classifier,
            credentials,
            logger,
        }
    }

    fn secret(&self, reply: Reply, prefix: &str) -> String {
        let value = match reply {
            Reply::Password => self.credentials.password,
            Reply::Passphrase => self.credentials.passphrase,
            Reply::Yes => Some("yes"),
            Reply::AcceptTemporarily => Some("t"),
        };
        match value {
            Some(value) => format!("{}\n", value),
            None => {
                warn!(prefix, "no {:?} configured, sending an empty line", reply);
                "\n".to_string()
            }
        }
    }

    /// Carry out `action` on `channel`
    pub fn apply(
        &self,
        action: SessionAction,
        channel: &mut dyn Channel,
        prefix: &str,
    ) -> DeployResult<()> {
        match action {
            SessionAction::PassThrough => Ok(()),
            SessionAction::Respond { narration, reply } => {
                self.logger.log(narration, prefix);
                channel.send_data(&self.secret(reply, prefix))?;
                Ok(())
            }
            SessionAction::Fatal { entry } => {
                let error = DeployError::protocol_fatal(channel.host(), entry);
                if let DeployError::ProtocolFatal { message, .. } = &error {
                    self.logger.log(message, prefix);
                }
                Err(error)
            }
        }
    }
}

impl LineHandler for SessionHandler<'_> {
    fn on_line(
        &mut self,
        channel: &mut dyn Channel,
        stream: StreamKind,
        line: &str,
    ) -> DeployResult<()> {
        let prefix = stream_prefix(stream, channel.host());
        self.logger.log(line, &prefix);
        let action = self.classifier.classify(line);
        self.apply(action, channel, &prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::RemoteError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Vec<String>,
    }

    impl Channel for RecordingChannel {
        fn host(&self) -> &str {
            "app01"
        }

        fn send_data(&mut self, data: &str) -> Result<(), RemoteError> {
            self.sent.push(data.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLogger(Mutex<Vec<(String, String)>>);

    impl PrefixLogger for RecordingLogger {
        fn log(&self, message: &str, prefix: &str) {
            self.0
                .lock()
                .unwrap()
                .push((message.to_string(), prefix.to_string()));
        }
    }

    fn classifier() -> PromptClassifier {
        PromptClassifier::new().unwrap()
    }

    #[test]
    fn test_classify_prompts() {
        let classifier = classifier();
        let reply = |line: &str| match classifier.classify(line) {
            SessionAction::Respond { reply, .. } => Some(reply),
            _ => None,
        };

        assert_eq!(reply("Password: "), Some(Reply::Password));
        assert_eq!(reply("Password for (something): "), Some(Reply::Password));
        assert_eq!(reply("someone's password: "), Some(Reply::Password));
        assert_eq!(
            reply("Are you sure you want to continue connecting (yes/no)? "),
            Some(Reply::Yes)
        );
        assert_eq!(
            reply("Enter passphrase for key '/home/deploy/.ssh/id_rsa': "),
            Some(Reply::Passphrase)
        );
        assert_eq!(
            reply("(R)eject, accept (t)emporarily or accept (p)ermanently? "),
            Some(Reply::AcceptTemporarily)
        );
        assert_eq!(reply("A    trunk/README"), None);
        assert_eq!(reply("password reset page updated"), None);
    }

    #[test]
    fn test_classify_replaced_directory() {
        assert_eq!(
            classifier().classify("svn: The entry 'foo' is no longer a directory"),
            SessionAction::Fatal {
                entry: "foo".to_string()
            }
        );
    }

    #[test]
    fn test_password_prompt_sends_exactly_the_password() {
        let logger = RecordingLogger::default();
        let credentials = SessionCredentials {
            password: Some("chocolatebrownies"),
            passphrase: None,
        };
        let mut handler = SessionHandler::new(classifier(), credentials, &logger);
        let mut channel = RecordingChannel::default();

        handler
            .on_line(&mut channel, StreamKind::Out, "Password for host: ")
            .unwrap();

        assert_eq!(channel.sent, vec!["chocolatebrownies\n"]);
        let logged = logger.0.lock().unwrap();
        assert_eq!(
            logged.as_slice(),
            &[
                ("Password for host: ".to_string(), "out :: app01".to_string()),
                (
                    "subversion is asking for a password".to_string(),
                    "out :: app01".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_fixed_replies() {
        let logger = RecordingLogger::default();
        let mut handler = SessionHandler::new(classifier(), SessionCredentials::default(), &logger);
        let mut channel = RecordingChannel::default();

        handler
            .on_line(&mut channel, StreamKind::Err, "continue connecting (yes/no)? ")
            .unwrap();
        handler
            .on_line(
                &mut channel,
                StreamKind::Out,
                "(R)eject, accept (t)emporarily or accept (p)ermanently? ",
            )
            .unwrap();

        assert_eq!(channel.sent, vec!["yes\n", "t\n"]);
    }

    #[test]
    fn test_missing_password_sends_empty_line() {
        let logger = RecordingLogger::default();
        let mut handler = SessionHandler::new(classifier(), SessionCredentials::default(), &logger);
        let mut channel = RecordingChannel::default();

        handler
            .on_line(&mut channel, StreamKind::Out, "Password: ")
            .unwrap();
        assert_eq!(channel.sent, vec!["\n"]);
    }

    #[test]
    fn test_replaced_directory_is_fatal_and_silent() {
        let logger = RecordingLogger::default();
        let mut handler = SessionHandler::new(classifier(), SessionCredentials::default(), &logger);
        let mut channel = RecordingChannel::default();

        let error = handler
            .on_line(
                &mut channel,
                StreamKind::Err,
                "svn: The entry 'foo' is no longer a directory",
            )
            .unwrap_err();

        match error {
            DeployError::ProtocolFatal { host, entry, .. } => {
                assert_eq!(host, "app01");
                assert_eq!(entry, "foo");
            }
            other => panic!("Expected ProtocolFatal, got {other:?}"),
        }
        assert!(channel.sent.is_empty());
        assert!(logger
            .0
            .lock()
            .unwrap()
            .iter()
            .any(|(message, _)| message.contains("'foo' was replaced")));
    }

    #[test]
    fn test_unmatched_lines_pass_through() {
        let logger = RecordingLogger::default();
        let mut handler = SessionHandler::new(classifier(), SessionCredentials::default(), &logger);
        let mut channel = RecordingChannel::default();

        handler
            .on_line(&mut channel, StreamKind::Out, "Checked out revision 42.")
            .unwrap();
        assert!(channel.sent.is_empty());
        assert_eq!(logger.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_credentials_follow_config_fallbacks() {
        use crate::domain::value_objects::RepositoryUrl;

        let config = RepositoryConfig::new(RepositoryUrl::new("/hello/world").unwrap())
            .with_password("chocolatebrownies")
            .with_svn_password("butterscotchcandies");
        let credentials = SessionCredentials::from_config(&config);
        assert_eq!(credentials.password, Some("butterscotchcandies"));
        assert_eq!(credentials.passphrase, Some("butterscotchcandies"));
        assert!(!format!("{:?}", credentials).contains("butterscotch"));
    }
}
