//! Interactive REPL for Sculpt scripts
//!
//! Each line is fed to an incremental parser, so names persist between
//! inputs and a rejected line leaves the scene untouched.

use anyhow::Result;
use glam::Vec3;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, EditMode, Editor};
use sculpt_csg::{FlatEvaluator, NodeKind, Tree, to_dot};
use sculpt_script::ScriptParser;
use std::path::{Path, PathBuf};

use crate::settings::Settings;
use crate::slice::Slice;

/// REPL state
pub struct Repl {
    parser: ScriptParser,
    editor: Editor<(), DefaultHistory>,
    history_path: Option<PathBuf>,
    settings: Settings,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(settings: &Settings) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .max_history_size(settings.history_size)?
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)?;

        let history_path = history_path();
        if let Some(ref path) = history_path {
            let _ = editor.load_history(path);
        }

        Ok(Self {
            parser: ScriptParser::new(),
            editor,
            history_path,
            settings: settings.clone(),
        })
    }

    /// Run the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("{}", WELCOME_MESSAGE);

        loop {
            match self.editor.readline("csg> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);

                    if trimmed.starts_with(':') {
                        match self.handle_command(trimmed) {
                            CommandResult::Continue => {}
                            CommandResult::Exit => break,
                            CommandResult::Error(e) => eprintln!("Error: {}", e),
                        }
                        continue;
                    }

                    self.feed(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Use :quit or Ctrl+D to exit");
                }
                Err(ReadlineError::Eof) => {
                    println!("\nGoodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Apply one statement and echo where it landed
    fn feed(&mut self, line: &str) {
        match self.parser.feed_line(line) {
            Ok(true) => {
                let tree = self.parser.tree();
                println!("=> {} nodes", tree.len());
            }
            Ok(false) => {}
            Err(e) => eprintln!("{}", e),
        }
    }

    /// Handle REPL commands
    fn handle_command(&mut self, cmd: &str) -> CommandResult {
        let (command, args) = match cmd.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (cmd, ""),
        };

        match command {
            ":help" | ":h" | ":?" => {
                println!("{}", HELP_MESSAGE);
                CommandResult::Continue
            }
            ":quit" | ":q" | ":exit" => CommandResult::Exit,
            ":reset" | ":r" => {
                self.parser = ScriptParser::new();
                println!("Scene cleared");
                CommandResult::Continue
            }
            ":names" | ":n" => {
                let bindings = self.parser.bindings();
                if bindings.is_empty() {
                    println!("No names bound");
                } else {
                    for (name, index) in bindings {
                        println!("  {} -> node {}", name, index);
                    }
                }
                CommandResult::Continue
            }
            ":tree" | ":t" => {
                print!("{}", describe(self.parser.tree()));
                CommandResult::Continue
            }
            ":dot" => {
                print!("{}", to_dot(self.parser.tree()));
                CommandResult::Continue
            }
            ":eval" | ":e" => match parse_point(args) {
                Some(p) => self.eval(p),
                None => CommandResult::Error("Usage: :eval <x> <y> <z>".to_string()),
            },
            ":slice" | ":s" => {
                let z = if args.is_empty() {
                    Some(0.0)
                } else {
                    args.parse().ok()
                };
                match z {
                    Some(z) => self.slice(z),
                    None => CommandResult::Error("Usage: :slice [z]".to_string()),
                }
            }
            ":load" | ":l" => {
                if args.is_empty() {
                    CommandResult::Error("Usage: :load <file>".to_string())
                } else {
                    self.load_script(Path::new(args))
                }
            }
            _ => CommandResult::Error(format!(
                "Unknown command: {}. Type :help for available commands.",
                command
            )),
        }
    }

    fn eval(&self, p: Vec3) -> CommandResult {
        match distance_at(self.parser.tree(), p) {
            Some(d) => {
                println!("{}", d);
                CommandResult::Continue
            }
            None => CommandResult::Error("Nothing to evaluate yet".to_string()),
        }
    }

    fn slice(&self, z: f32) -> CommandResult {
        if self.parser.tree().is_empty() {
            return CommandResult::Error("Nothing to slice yet".to_string());
        }
        let tree = self.parser.tree().optimized();
        let resolution = self.settings.slice_resolution as usize;
        let slice = Slice::sample(&tree, resolution, self.settings.slice_extent, z);
        print!("{}", slice.to_ascii(&self.settings.ramp()));
        CommandResult::Continue
    }

    /// Feed every line of a file, stopping at the first error
    fn load_script(&mut self, path: &Path) -> CommandResult {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return CommandResult::Error(format!("Failed to read {}: {}", path.display(), e));
            }
        };

        println!("Loading {}...", path.display());
        for line in source.lines() {
            if let Err(e) = self.parser.feed_line(line) {
                return CommandResult::Error(e.to_string());
            }
        }
        println!("=> {} nodes", self.parser.tree().len());
        CommandResult::Continue
    }
}

/// Result of handling a command
enum CommandResult {
    Continue,
    Exit,
    Error(String),
}

fn parse_point(args: &str) -> Option<Vec3> {
    let coords: Vec<f32> = args
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match coords[..] {
        [x, y, z] => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

/// Distance from the compacted scene, `None` while nothing is bound.
fn distance_at(tree: &Tree, p: Vec3) -> Option<f32> {
    if tree.is_empty() {
        return None;
    }
    let tree = tree.optimized();
    Some(FlatEvaluator::with_capacity(tree.len()).distance(&tree, p))
}

/// One line per node in arena order, root marked with `*`.
fn describe(tree: &Tree) -> String {
    if tree.is_empty() {
        return "Empty tree\n".to_string();
    }

    let mut out = String::new();
    for (i, node) in tree.nodes.iter().enumerate() {
        let marker = if tree.root == Some(i) { '*' } else { ' ' };
        let name = node.name.as_deref().unwrap_or("-");
        let body = match &node.kind {
            NodeKind::Primitive(primitive) => {
                let [x, y, z, size, _] = primitive.params;
                format!("{} {} {} {} {}", primitive.kind.keyword(), x, y, z, size)
            }
            NodeKind::Operation {
                operation,
                children: [a, b],
            } => format!(
                "blend {} softness {} ({}, {})",
                operation.blend, operation.softness, a, b
            ),
        };
        out.push_str(&format!("{}{:>4}  {:<12} {}\n", marker, i, name, body));
    }
    out
}

/// Get the history file path
fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sculpt").join("repl_history"))
}

const WELCOME_MESSAGE: &str = r#"
Sculpt interactive CSG REPL

  Type statements such as `a = sphere 0 0 0 1` or `a -= 0.5 0.1 b`.
  Type :help for commands.
"#;

const HELP_MESSAGE: &str = r#"
Statements:
  <name> = sphere x y z radius
  <name> = cube x y z half_size
  <name> = <other>                  - move <other> under a new name
  <name> += [blend [softness]] <operand>
  <name> -= [blend [softness]] <operand>

Commands:
  :help, :h, :?     - Show this help message
  :quit, :q, :exit  - Exit the REPL
  :reset, :r        - Start a new scene
  :names, :n        - Show bound names
  :tree, :t         - List nodes in parse order
  :dot              - Print the tree as a Graphviz graph
  :eval x y z       - Signed distance at a point
  :slice [z]        - Text slice through the plane z
  :load <file>      - Feed a script file into the scene

Tips:
  - A rejected statement changes nothing
  - Using a name as an operand consumes it
  - Use Ctrl+D to exit
"#;

/// Entry point for the REPL command
pub fn run_repl(settings: &Settings) -> Result<()> {
    let mut repl = Repl::new(settings)?;
    repl.run()
}
