//! Structured shell command construction.
//!
//! Arguments are quoted when rendered; the final string only exists as output.

use std::fmt;

/// Characters that never need quoting in a POSIX shell word
fn is_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
}

/// Quote a single word for `sh`
pub fn quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_safe_char) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// A single program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    stdout_to: Option<String>,
    append: bool,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_to: None,
            append: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` only when `value` is present
    pub fn opt_arg(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    /// Redirect standard output to a file
    pub fn stdout_to(mut self, path: impl Into<String>) -> Self {
        self.stdout_to = Some(path.into());
        self.append = false;
        self
    }

    /// Append standard output to a file
    pub fn append_to(mut self, path: impl Into<String>) -> Self {
        self.stdout_to = Some(path.into());
        self.append = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn render(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(quote(&self.program));
        words.extend(self.args.iter().map(|arg| quote(arg)));
        let mut rendered = words.join(" ");
        if let Some(path) = &self.stdout_to {
            rendered.push_str(if self.append { " >> " } else { " > " });
            rendered.push_str(&quote(path));
        }
        rendered
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Commands joined with `&&`
///
/// A chain marked as continued renders with a trailing `&&`, so whatever the
/// caller appends only runs when every link before it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    first: ShellCommand,
    rest: Vec<ShellCommand>,
    continued: bool,
}

impl CommandChain {
    pub fn new(first: ShellCommand) -> Self {
        Self {
            first,
            rest: Vec::new(),
            continued: false,
        }
    }

    /// Append a link that runs only if everything before it succeeded
    pub fn and_then(mut self, command: ShellCommand) -> Self {
        self.rest.push(command);
        self.continued = false;
        self
    }

    /// Append several links in order and close the chain, even when there
    /// were none to append
    pub fn and_then_all(self, commands: impl IntoIterator<Item = ShellCommand>) -> Self {
        commands
            .into_iter()
            .fold(self, |chain, command| chain.and_then(command))
            .finished()
    }

    /// Leave the chain open for a downstream step
    pub fn continued(mut self) -> Self {
        self.continued = true;
        self
    }

    /// Close a chain that nothing was appended to
    pub fn finished(mut self) -> Self {
        self.continued = false;
        self
    }

    pub fn is_continued(&self) -> bool {
        self.continued
    }

    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub fn render(&self) -> String {
        let mut rendered = self.first.render();
        for command in &self.rest {
            rendered.push_str(" && ");
            rendered.push_str(&command.render());
        }
        if self.continued {
            rendered.push_str(" &&");
        }
        rendered
    }
}

impl From<ShellCommand> for CommandChain {
    fn from(command: ShellCommand) -> Self {
        Self::new(command)
    }
}

impl fmt::Display for CommandChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
