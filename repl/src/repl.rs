use crate::error::ReplError;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use rubric_core::interpreter::{Env, Environment, Interpreter, Value};
use rubric_core::lexer::{Lexer, TokenKind};
use rubric_core::parser::Parser;
use std::collections::{BTreeMap, HashMap};

type CommandFn = fn(&mut Repl, &[&str]) -> anyhow::Result<()>;

const SETTINGS: [&str; 3] = ["debug", "tokens", "ast"];

pub struct Repl {
    interpreter: Interpreter,
    env: Env,
    pub commands: HashMap<String, CommandFn>,
    pub history: Vec<String>,
    pub input_buffer: String,
    settings: BTreeMap<String, bool>,
    line_number: usize,
    exit_requested: bool,
}

impl Repl {
    pub fn new() -> Self {
        let mut commands = HashMap::new();
        commands.insert("help".to_string(), Self::cmd_help as CommandFn);
        commands.insert("exit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("quit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("history".to_string(), Self::cmd_history as CommandFn);
        commands.insert("vars".to_string(), Self::cmd_vars as CommandFn);
        commands.insert("set".to_string(), Self::cmd_set as CommandFn);
        commands.insert("debug".to_string(), Self::cmd_debug as CommandFn);
        commands.insert("tokens".to_string(), Self::cmd_tokens as CommandFn);
        commands.insert("ast".to_string(), Self::cmd_ast as CommandFn);
        commands.insert("reset".to_string(), Self::cmd_reset as CommandFn);

        let settings = SETTINGS
            .iter()
            .map(|name| (name.to_string(), false))
            .collect();

        Self {
            interpreter: Interpreter::new(),
            env: Environment::root(),
            commands,
            history: Vec::new(),
            input_buffer: String::new(),
            settings,
            line_number: 1,
            exit_requested: false,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let span = tracing::trace_span!("repl");
        let _enter = span.enter();
        let mut editor = Reedline::create();

        println!("\x1B[94mRubric Lang REPL v{}\x1B[0m", env!("CARGO_PKG_VERSION"));
        println!("\x1B[93mType ':help' for commands, ':exit' to quit.\x1B[0m");

        while !self.exit_requested {
            let prompt = self.make_prompt();
            let line = match editor.read_line(&prompt) {
                Ok(Signal::Success(input)) => input,
                Ok(Signal::CtrlD) => break,
                Ok(Signal::CtrlC) => {
                    self.input_buffer.clear();
                    continue;
                }
                Err(e) => {
                    println!("Input error: {e}");
                    continue;
                }
            };

            let trimmed = line.trim();
            if self.input_buffer.is_empty() {
                if let Some(command) = trimmed.strip_prefix(':') {
                    self.dispatch_command(command);
                    continue;
                }
                if trimmed.is_empty() {
                    continue;
                }
            }

            self.input_buffer.push_str(&line);
            self.input_buffer.push('\n');
            if open_braces(&self.input_buffer) > 0 {
                continue;
            }

            let code = std::mem::take(&mut self.input_buffer);
            self.evaluate_and_print(&code);
            self.history.push(code.trim_end().to_string());
            self.line_number += 1;
        }

        println!("Goodbye!");
        Ok(())
    }

    fn dispatch_command(&mut self, command: &str) {
        let mut parts = command.split_whitespace();
        let Some(name) = parts.next() else {
            return;
        };
        let args: Vec<&str> = parts.collect();

        match self.commands.get(name).copied() {
            Some(handler) => {
                if let Err(e) = handler(self, &args) {
                    println!("\x1B[31mError: {e}\x1B[0m");
                }
            }
            None => println!("Unknown command: {name}"),
        }
    }

    fn make_prompt(&self) -> DefaultPrompt {
        if self.input_buffer.is_empty() {
            DefaultPrompt::new(
                DefaultPromptSegment::Basic(format!("rubric[{}]", self.line_number)),
                DefaultPromptSegment::Empty,
            )
        } else {
            let depth = open_braces(&self.input_buffer).max(0) as usize;
            DefaultPrompt::new(
                DefaultPromptSegment::Basic(format!("...{}", "  ".repeat(depth))),
                DefaultPromptSegment::Empty,
            )
        }
    }

    fn setting(&self, name: &str) -> bool {
        self.settings.get(name).copied().unwrap_or(false)
    }

    fn evaluate_and_print(&mut self, code: &str) {
        match self.evaluate_input(code) {
            Ok(value) => print_value(&value),
            Err(e) => println!("\x1B[31m{e}\x1B[0m"),
        }
    }

    /// Parses and runs one entry against the session's root scope.
    pub fn evaluate_input(&mut self, input: &str) -> Result<Value, ReplError> {
        if self.setting("debug") {
            println!("DEBUG: Evaluating input:\n{}", input.trim_end());
        }
        if self.setting("tokens") {
            for token in Lexer::tokenize(input) {
                println!(
                    "  {:>3}:{:<3} {:<10} {:?}",
                    token.line, token.column, token.kind, token.literal
                );
            }
        }

        let mut parser = Parser::from_source(input);
        let program = parser.parse_program();
        let errors = parser.into_errors();
        if !errors.is_empty() {
            return Err(ReplError::from_parse_errors(input, errors));
        }

        if self.setting("ast") {
            for statement in &program.statements {
                println!("  {}", statement);
            }
        }

        let value = self.interpreter.run(&program, &self.env)?;
        if self.setting("debug") {
            println!("DEBUG: {:?}", value);
        }
        Ok(value)
    }

    fn cmd_help(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Available commands:");
        let mut names: Vec<&String> = self.commands.keys().collect();
        names.sort();
        for name in names {
            println!("  :{name}");
        }
        println!("Settings (:set name=on|off): {}", SETTINGS.join(", "));
        println!("Type code to evaluate it. Input continues while braces are open.");
        Ok(())
    }

    fn cmd_exit(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Exiting REPL...");
        self.exit_requested = true;
        Ok(())
    }

    fn cmd_history(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        for (i, entry) in self.history.iter().enumerate() {
            println!("{:>4}  {}", i + 1, entry);
        }
        Ok(())
    }

    fn cmd_vars(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let bindings = self.env.borrow().bindings();
        if bindings.is_empty() {
            println!("(No variables in current scope)");
            return Ok(());
        }

        println!("Variables in current scope:");
        for (name, value, constant) in bindings {
            let keyword = if constant { "const" } else { "var" };
            println!("  {keyword} {name}: {} = {value}", value.type_name());
        }
        Ok(())
    }

    fn cmd_set(&mut self, args: &[&str]) -> anyhow::Result<()> {
        if args.is_empty() {
            for (name, enabled) in &self.settings {
                println!("  {name} = {}", if *enabled { "on" } else { "off" });
            }
            return Ok(());
        }

        let joined = args.join(" ");
        let (name, value) = match joined.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None if args.len() == 2 => (args[0], args[1]),
            None => anyhow::bail!("Usage: :set <name>=<on|off>"),
        };
        self.apply_setting(name, value)
    }

    fn cmd_debug(&mut self, args: &[&str]) -> anyhow::Result<()> {
        self.toggle("debug", args)
    }

    fn cmd_tokens(&mut self, args: &[&str]) -> anyhow::Result<()> {
        self.toggle("tokens", args)
    }

    fn cmd_ast(&mut self, args: &[&str]) -> anyhow::Result<()> {
        self.toggle("ast", args)
    }

    fn cmd_reset(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        self.env = Environment::root();
        println!("Environment cleared.");
        Ok(())
    }

    /// `:debug` flips the flag; `:debug on|off` sets it.
    fn toggle(&mut self, name: &str, args: &[&str]) -> anyhow::Result<()> {
        match args.first() {
            Some(value) => self.apply_setting(name, value),
            None => {
                let enabled = !self.setting(name);
                self.apply_setting(name, if enabled { "on" } else { "off" })
            }
        }
    }

    fn apply_setting(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let Some(slot) = self.settings.get_mut(name) else {
            anyhow::bail!("Unknown setting '{name}'. Known settings: {}", SETTINGS.join(", "));
        };
        *slot = parse_switch(value)?;
        tracing::debug!(setting = name, enabled = *slot, "setting changed");
        println!("{name} = {}", if *slot { "on" } else { "off" });
        Ok(())
    }
}

fn parse_switch(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => anyhow::bail!("Expected on or off, got '{other}'"),
    }
}

/// Net count of unclosed `{` in `source`, ignoring braces inside strings and comments.
fn open_braces(source: &str) -> i64 {
    Lexer::tokenize(source)
        .iter()
        .map(|token| match token.kind {
            TokenKind::LBrace => 1,
            TokenKind::RBrace => -1,
            _ => 0,
        })
        .sum()
}

fn print_value(value: &Value) {
    match value {
        Value::Null => {}
        Value::Integer(n) => println!("=> \x1B[33m{n}\x1B[0m"),
        Value::Float(f) => println!("=> \x1B[33m{f}\x1B[0m"),
        Value::Boolean(b) => println!("=> \x1B[35m{b}\x1B[0m"),
        Value::String(s) => println!("=> \x1B[32m\"{s}\"\x1B[0m"),
        Value::Function(_) => println!("=> \x1B[36m{value}\x1B[0m"),
    }
}
