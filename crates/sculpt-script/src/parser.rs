//! Statement compiler
//!
//! Each non-blank line is one statement:
//!
//! ```text
//! <name> =  <operand>
//! <name> += [blend [softness]] <operand>
//! <name> -= [blend [softness]] <operand>
//! <operand> ::= <name> | sphere x y z radius | cube x y z half_size
//! ```
//!
//! Using a name as an operand moves it: the name is unbound and its subtree
//! becomes part of the statement's target. Mutating a name keeps its node
//! index stable; the node is spliced into an operation whose first child
//! holds the previous payload.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use sculpt_csg::{Operation, Primitive, PrimitiveKind, Tree};

use crate::error::{Error, ParseErrorKind, Result};
use crate::lexer::{Cursor, Operator, strip_comment};

type Compiled<T> = std::result::Result<T, ParseErrorKind>;

/// Right-hand side of a statement.
#[derive(Debug, Clone, PartialEq)]
enum Operand<'a> {
    Name(&'a str),
    Primitive(Primitive),
}

/// One compiled line, not yet applied to the tree.
#[derive(Debug, Clone, PartialEq)]
struct Statement<'a> {
    target: &'a str,
    /// `None` for plain assignment
    operation: Option<Operation>,
    operand: Operand<'a>,
}

/// Incremental parser: feed it lines, then [`finish`](ScriptParser::finish).
///
/// A failed [`feed_line`](ScriptParser::feed_line) leaves the parser as it
/// was before the call, which lets interactive front ends report the error
/// and carry on.
#[derive(Debug, Clone, Default)]
pub struct ScriptParser {
    tree: Tree,
    names: HashMap<String, usize>,
    consumed: HashSet<String>,
    line: usize,
    statements: usize,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree in parse order, before compaction.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Number of lines fed so far, blank and comment lines included.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Number of statements applied so far.
    pub fn statements(&self) -> usize {
        self.statements
    }

    /// Node index currently bound to `name`.
    pub fn binding(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Bound names with their node indices, sorted by name.
    pub fn bindings(&self) -> Vec<(&str, usize)> {
        let mut bindings: Vec<_> = self
            .names
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
            .collect();
        bindings.sort_unstable();
        bindings
    }

    /// Whether `name` has been moved into another node.
    pub fn is_consumed(&self, name: &str) -> bool {
        !self.names.contains_key(name) && self.consumed.contains(name)
    }

    /// Compile and apply one line. Returns `false` for blank and comment
    /// lines.
    pub fn feed_line(&mut self, line: &str) -> Result<bool> {
        self.line += 1;
        let code = strip_comment(line);

        let statement = match self.compile(code) {
            Ok(Some(statement)) => statement,
            Ok(None) => return Ok(false),
            Err(kind) => return Err(self.error(line, kind)),
        };

        if let Err(kind) = self.apply(&statement) {
            return Err(self.error(line, kind));
        }
        self.statements += 1;
        Ok(true)
    }

    /// Compact the tree and hand it over.
    pub fn finish(self) -> Result<Tree> {
        if self.statements == 0 {
            return Err(Error::Empty);
        }

        let parsed = self.tree.len();
        let mut tree = self.tree;
        tree.optimize();

        tracing::info!(
            statements = self.statements,
            parsed_nodes = parsed,
            nodes = tree.len(),
            "Parsed CSG script"
        );
        Ok(tree)
    }

    fn error(&self, line: &str, kind: ParseErrorKind) -> Error {
        Error::Parse {
            line: self.line,
            text: line.trim_end_matches(['\r', '\n']).to_string(),
            kind,
        }
    }

    /// Syntax pass: tokenise one line into a [`Statement`] without touching
    /// any state.
    fn compile<'a>(&self, code: &'a str) -> Compiled<Option<Statement<'a>>> {
        let mut cursor = Cursor::new(code);
        let Some(target) = cursor.next_name()? else {
            return Ok(None);
        };
        if PrimitiveKind::from_keyword(target).is_some() {
            return Err(ParseErrorKind::ReservedName(target.to_string()));
        }

        let operator = cursor.eat_operator().ok_or(ParseErrorKind::MissingOperator)?;

        let operation = match operator {
            Operator::Assign => None,
            Operator::Add | Operator::Subtract => {
                if self.statements == 0 {
                    return Err(ParseErrorKind::FirstEditNotAssignment);
                }
                let mut operation = Operation::default();
                if cursor.at_number() {
                    operation.blend = cursor.next_number()?.unwrap_or(operation.blend);
                    operation.softness = 0.0;
                    if cursor.at_number() {
                        operation.softness = cursor.next_number()?.unwrap_or(0.0);
                    }
                }
                // Negated as typed, so `a -= -0.5 b` blends a union at 0.5.
                if operator == Operator::Subtract {
                    operation.blend = -operation.blend;
                }
                Some(operation)
            }
        };

        let operand = match cursor.next_token()? {
            None => return Err(ParseErrorKind::MissingOperand),
            Some(token) => match PrimitiveKind::from_keyword(token) {
                Some(kind) => Operand::Primitive(parse_primitive(&mut cursor, kind)?),
                // a name followed by numbers reads as a call to an unknown shape
                None if cursor.at_number() => {
                    return Err(ParseErrorKind::UnknownPrimitive(token.to_string()));
                }
                None => Operand::Name(token),
            },
        };

        if !cursor.is_empty() {
            return Err(ParseErrorKind::TrailingInput(cursor.remainder().to_string()));
        }

        Ok(Some(Statement {
            target,
            operation,
            operand,
        }))
    }

    /// Semantic pass: resolve names and grow the tree. All checks happen
    /// before the first mutation.
    fn apply(&mut self, statement: &Statement<'_>) -> Compiled<()> {
        let target = statement.target;

        match statement.operation {
            None => {
                let index = match &statement.operand {
                    Operand::Name(name) => {
                        let index = self.take_operand(name)?;
                        self.tree.nodes[index].name = Some(target.to_string());
                        index
                    }
                    Operand::Primitive(primitive) => {
                        if self.tree.is_empty() {
                            self.tree.root = Some(0);
                        }
                        let index = self.tree.add_primitive(*primitive);
                        self.tree.nodes[index].name = Some(target.to_string());
                        index
                    }
                };
                tracing::debug!(line = self.line, target, index, "assign");
                self.consumed.remove(target);
                self.names.insert(target.to_string(), index);
            }
            Some(operation) => {
                let parent = match self.names.get(target) {
                    Some(&parent) => parent,
                    None if self.consumed.contains(target) => {
                        return Err(ParseErrorKind::ConsumedName(target.to_string()));
                    }
                    None => return Err(ParseErrorKind::UnknownName(target.to_string())),
                };

                let operand = match &statement.operand {
                    Operand::Name(name) if *name == target => {
                        return Err(ParseErrorKind::SelfReference(target.to_string()));
                    }
                    Operand::Name(name) => self.take_operand(name)?,
                    Operand::Primitive(primitive) => self.tree.add_primitive(*primitive),
                };

                let relocated = self.tree.splice(parent, operation, operand);
                tracing::debug!(
                    line = self.line,
                    target,
                    parent,
                    relocated,
                    operand,
                    blend = operation.blend,
                    softness = operation.softness,
                    "splice"
                );
            }
        }

        Ok(())
    }

    /// Unbind `name` and return its node, recording it as consumed.
    fn take_operand(&mut self, name: &str) -> Compiled<usize> {
        let index = self
            .names
            .remove(name)
            .ok_or_else(|| ParseErrorKind::UnknownName(name.to_string()))?;
        self.consumed.insert(name.to_string());
        Ok(index)
    }
}

fn parse_primitive(cursor: &mut Cursor<'_>, kind: PrimitiveKind) -> Compiled<Primitive> {
    let expected = kind.param_count();
    let mut params = Vec::with_capacity(expected);
    for found in 0..expected {
        match cursor.next_number()? {
            Some(value) => params.push(value),
            None => {
                return Err(ParseErrorKind::MissingParameters {
                    primitive: kind.keyword(),
                    expected,
                    found,
                });
            }
        }
    }
    Ok(Primitive::new(kind, &params))
}

/// Parse any sequence of lines into an optimized tree.
pub fn parse_lines<I, S>(lines: I) -> Result<Tree>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = ScriptParser::new();
    for line in lines {
        parser.feed_line(line.as_ref())?;
    }
    parser.finish()
}

/// Parse an in-memory script.
pub fn parse_str(source: &str) -> Result<Tree> {
    parse_lines(source.lines())
}

/// Parse a script from a buffered reader; read failures abort the parse.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Tree> {
    let mut parser = ScriptParser::new();
    for line in reader.lines() {
        parser.feed_line(&line?)?;
    }
    parser.finish()
}

/// Parse a script file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Tree> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Loading CSG script");
    parse_reader(std::io::BufReader::new(file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;
    use sculpt_csg::NodeKind;

    fn kind_of(result: Result<Tree>) -> ParseErrorKind {
        match result {
            Err(Error::Parse { kind, .. }) => kind,
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn single_assignment() {
        let tree = parse_str("a = sphere 1 2 3 4").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root, Some(0));
        assert_eq!(tree.nodes[0].name.as_deref(), Some("a"));
        assert_eq!(
            tree.nodes[0].kind,
            NodeKind::Primitive(Primitive::sphere(Vec3::new(1.0, 2.0, 3.0), 4.0))
        );
    }

    #[test]
    fn union_of_two_names() {
        let tree = parse_str("a = sphere 0 0 0 1\nb = sphere 1 0 0 1\na += b\n").unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root, Some(2));
        match &tree.nodes[2].kind {
            NodeKind::Operation {
                operation,
                children,
            } => {
                assert_eq!(*operation, Operation::union());
                assert!(children.iter().all(|&c| tree.nodes[c].is_leaf()));
            }
            other => panic!("root should be an operation, got {:?}", other),
        }
        assert_eq!(tree.nodes[2].name.as_deref(), Some("a"));
    }

    #[test]
    fn mutation_keeps_index() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("b = cube 2 0 0 1").unwrap();
        assert_eq!(parser.binding("a"), Some(0));
        parser.feed_line("a += b").unwrap();
        parser.feed_line("a -= sphere 0 0 0 0.5").unwrap();
        assert_eq!(parser.binding("a"), Some(0));
        assert_eq!(parser.binding("b"), None);
        assert!(parser.is_consumed("b"));
        assert!(!parser.tree().nodes[0].is_leaf());
    }

    #[test]
    fn consumed_name_cannot_be_reused() {
        let err = kind_of(parse_str(
            "a = sphere 0 0 0 1\nb = sphere 1 0 0 1\na += b\nc = b",
        ));
        assert_eq!(err, ParseErrorKind::UnknownName("b".into()));
    }

    #[test]
    fn consumed_and_unknown_targets_differ() {
        let consumed = kind_of(parse_str(
            "a = sphere 0 0 0 1\nb = sphere 1 0 0 1\na += b\nb += sphere 0 0 0 1",
        ));
        assert_eq!(consumed, ParseErrorKind::ConsumedName("b".into()));

        let unknown = kind_of(parse_str("a = sphere 0 0 0 1\nz += sphere 0 0 0 1"));
        assert_eq!(unknown, ParseErrorKind::UnknownName("z".into()));
    }

    #[test]
    fn first_statement_must_assign() {
        let result = parse_str("# header\n\na += sphere 0 0 0 1\n");
        match result {
            Err(Error::Parse { line, kind, text }) => {
                assert_eq!(line, 3);
                assert_eq!(kind, ParseErrorKind::FirstEditNotAssignment);
                assert_eq!(text, "a += sphere 0 0 0 1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn modifiers_default_and_explicit() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("a += 0.8 0.2 sphere 1 0 0 1").unwrap();
        parser.feed_line("a += 0.5 cube 0 1 0 1").unwrap();
        parser.feed_line("a -= sphere 0 0 1 1").unwrap();

        let op = |i: usize| match parser.tree().nodes[i].kind {
            NodeKind::Operation { operation, .. } => operation,
            NodeKind::Primitive(_) => panic!("node {i} is a leaf"),
        };
        // node 0 is the latest operation; earlier ones were relocated
        assert_eq!(op(0), Operation::new(-1.0, 0.0));
        let [previous, _] = parser.tree().nodes[0].children().unwrap();
        assert_eq!(op(previous), Operation::new(0.5, 0.0));
        let [first, _] = parser.tree().nodes[previous].children().unwrap();
        assert_eq!(op(first), Operation::new(0.8, 0.2));
    }

    #[test]
    fn subtraction_negates_typed_blend() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("b = sphere 0 0 0 1").unwrap();
        parser.feed_line("a -= -0.5 b").unwrap();
        match parser.tree().nodes[0].kind {
            NodeKind::Operation { operation, .. } => assert_eq!(operation.blend, 0.5),
            NodeKind::Primitive(_) => panic!("expected an operation"),
        }
    }

    #[test]
    fn subtraction_carves_hole() {
        let tree = parse_str("a = sphere 0 0 0 2\nb = sphere 0 0 0 1\na -= b").unwrap();
        let d = tree.evaluate(Vec3::ZERO);
        assert!(d > 0.0);
        assert_relative_eq!(d, 1.0);
        assert_relative_eq!(tree.evaluate_flat(Vec3::ZERO), d);
    }

    #[test]
    fn alias_assignment_moves_the_subtree() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("b = cube 0 0 0 1").unwrap();
        parser.feed_line("c = b").unwrap();
        assert_eq!(parser.binding("c"), Some(1));
        assert_eq!(parser.binding("b"), None);
        assert_eq!(parser.tree().nodes[1].name.as_deref(), Some("c"));
        assert!(parser.is_consumed("b"));
        assert_eq!(
            parser.feed_line("a += b").unwrap_err().kind(),
            Some(&ParseErrorKind::UnknownName("b".into()))
        );
        parser.feed_line("a += c").unwrap();
        assert_eq!(parser.finish().unwrap().len(), 3);
    }

    #[test]
    fn operators_bind_without_spaces() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a=sphere 0 0 0 2").unwrap();
        parser.feed_line("b =sphere 0 0 0 1").unwrap();
        parser.feed_line("c= cube 3 0 0 1").unwrap();
        parser.feed_line("a-= b").unwrap();
        parser.feed_line("a+=0.5 c").unwrap();
        assert_eq!(parser.binding("a"), Some(0));
        assert!(parser.is_consumed("b"));
        assert!(parser.is_consumed("c"));
        match parser.tree().nodes[0].kind {
            NodeKind::Operation { operation, .. } => assert_eq!(operation, Operation::new(0.5, 0.0)),
            NodeKind::Primitive(_) => panic!("expected an operation"),
        }
        assert_eq!(kind_of(parse_str("a+sphere 0 0 0 1")), ParseErrorKind::MissingOperator);
    }

    #[test]
    fn reassignment_overwrites_binding() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("a = cube 0 0 0 1").unwrap();
        assert_eq!(parser.binding("a"), Some(1));
        // the root stays on the first node ever created
        let tree = parser.finish().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.nodes[0].kind,
            NodeKind::Primitive(Primitive::sphere(Vec3::ZERO, 1.0))
        );
    }

    #[test]
    fn unreachable_statements_are_dropped() {
        let tree = parse_str("a = sphere 0 0 0 1\nb = sphere 5 0 0 1\nb += cube 6 0 0 1").unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn grammar_errors() {
        let cases = [
            ("a sphere 0 0 0 1", ParseErrorKind::MissingOperator),
            ("a =", ParseErrorKind::MissingOperand),
            ("sphere = sphere 0 0 0 1", ParseErrorKind::ReservedName("sphere".into())),
            ("a = torus", ParseErrorKind::UnknownName("torus".into())),
            ("a = torus 0 0 0 1", ParseErrorKind::UnknownPrimitive("torus".into())),
            ("a = sphere 0 0 x 1", ParseErrorKind::InvalidNumber("x".into())),
            (
                "a = cube 0 0 0",
                ParseErrorKind::MissingParameters {
                    primitive: "cube",
                    expected: 4,
                    found: 3,
                },
            ),
            ("a = sphere 0 0 0 1 9", ParseErrorKind::TrailingInput("9".into())),
            ("\"a = sphere 0 0 0 1", ParseErrorKind::UnterminatedString),
        ];
        for (source, expected) in cases {
            assert_eq!(kind_of(parse_str(source)), expected, "source: {source}");
        }
    }

    #[test]
    fn mutation_errors() {
        let base = "a = sphere 0 0 0 1\n";
        let cases = [
            ("a += a", ParseErrorKind::SelfReference("a".into())),
            ("a += 0.5 x1 b", ParseErrorKind::TrailingInput("b".into())),
            ("a += 1.2.3 b", ParseErrorKind::InvalidNumber("1.2.3".into())),
            ("a += 0.5", ParseErrorKind::MissingOperand),
        ];
        for (line, expected) in cases {
            let source = format!("{base}{line}");
            assert_eq!(kind_of(parse_str(&source)), expected, "line: {line}");
        }
    }

    #[test]
    fn failed_line_leaves_parser_untouched() {
        let mut parser = ScriptParser::new();
        parser.feed_line("a = sphere 0 0 0 1").unwrap();
        parser.feed_line("b = sphere 1 0 0 1").unwrap();
        let before = parser.tree().clone();

        let err = parser.feed_line("b += c").unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(parser.tree(), &before);
        assert_eq!(parser.binding("b"), Some(1));
        assert_eq!(parser.statements(), 2);
    }

    #[test]
    fn comments_and_blank_lines() {
        let source = "# a snowman\n\n  body = sphere 0 0 0 1 # base\n\thead = sphere 0 1.5 0 0.6\nbody += 1 0.3 head\n";
        let tree = parse_str(source).unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn empty_script() {
        assert!(matches!(parse_str("# nothing here\n\n"), Err(Error::Empty)));
    }

    #[test]
    fn reader_input() {
        let source = b"a = sphere 0 0 0 1\na += cube 0 0 0 0.5\n";
        let tree = parse_reader(&source[..]).unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn missing_file() {
        let err = load_file("/nonexistent/scene.csg").unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
