//! Go complexity engines built on tree-sitter.
//!
//! Cyclomatic complexity follows gocyclo: 1 plus one per `if`, `for`,
//! non-default `case`, and `&&`/`||` operator. Cognitive complexity follows
//! gocognit: structural increments grow with nesting, `else`/`else if` add
//! a flat point, each run of identical logical operators adds one, and so do
//! labeled jumps and direct recursion.

use super::{group_by_file, FileComplexity, FunctionComplexity};
use crate::errors::{Error, Result};
use crate::paths;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoMetric {
    Cyclomatic,
    Cognitive,
}

/// Analyze every `.go` file under `root` and group results per file.
///
/// Hidden directories are skipped and `exclude` is matched against the
/// repository-relative path. Files without functions are omitted.
pub fn analyze_repository(
    root: &Path,
    metric: GoMetric,
    exclude: Option<&Regex>,
) -> Result<Vec<FileComplexity>> {
    let files = discover_go_files(root, exclude)?;
    log::debug!("Analyzing {} Go files under {}", files.len(), root.display());

    let per_file: Vec<Vec<FunctionComplexity>> = files
        .par_iter()
        .map(|(absolute, relative)| -> Result<Vec<FunctionComplexity>> {
            let source = fs::read_to_string(absolute)?;
            analyze_source(&source, relative, metric)
        })
        .collect::<Result<_>>()?;

    Ok(group_by_file(per_file.into_iter().flatten().collect()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn discover_go_files(root: &Path, exclude: Option<&Regex>) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping directory entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|e| e.to_str()) != Some("go")
        {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => paths::normalize_path(&relative.to_string_lossy()),
            Err(_) => paths::repo_relative(entry.path(), root)?,
        };
        if exclude.is_some_and(|pattern| pattern.is_match(&relative)) {
            continue;
        }
        files.push((entry.into_path(), relative));
    }

    Ok(files)
}

/// Parse one Go source file and score each function and method in it.
pub fn analyze_source(source: &str, file: &str, metric: GoMetric) -> Result<Vec<FunctionComplexity>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| Error::parse(file, 0, e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::parse(file, 0, "tree-sitter produced no syntax tree"))?;
    let root = tree.root_node();
    if root.has_error() {
        log::warn!("Syntax errors in {}, results may be incomplete", file);
    }

    let bytes = source.as_bytes();
    let packages: Vec<String> = package_name(root, bytes).into_iter().collect();

    let mut functions = Vec::new();
    for node in root.children(&mut root.walk()) {
        let Some(signature) = FunctionSignature::from_node(node, bytes) else {
            continue;
        };

        let complexity = match metric {
            GoMetric::Cyclomatic => cyclomatic_complexity(node),
            GoMetric::Cognitive => cognitive_complexity(node, &signature, bytes),
        };

        functions.push(FunctionComplexity {
            file: file.to_string(),
            name: signature.display_name(),
            packages: packages.clone(),
            line: node.start_position().row + 1,
            length: node.end_position().row - node.start_position().row + 1,
            complexity,
        });
    }

    Ok(functions)
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn package_name(root: Node, source: &[u8]) -> Option<String> {
    root.children(&mut root.walk())
        .find(|child| child.kind() == "package_clause")
        .and_then(|clause| {
            clause
                .children(&mut clause.walk())
                .find(|child| child.kind() == "package_identifier")
        })
        .map(|ident| text(ident, source).to_string())
}

/// Name and receiver of a top-level function or method declaration.
struct FunctionSignature {
    name: String,
    /// Receiver type as written, generics stripped: `T` or `*T`
    receiver_type: Option<String>,
    /// Receiver variable, used to spot `r.Method()` recursion
    receiver_name: Option<String>,
}

impl FunctionSignature {
    fn from_node(node: Node, source: &[u8]) -> Option<Self> {
        let name = text(node.child_by_field_name("name")?, source).to_string();
        match node.kind() {
            "function_declaration" => Some(Self {
                name,
                receiver_type: None,
                receiver_name: None,
            }),
            "method_declaration" => {
                let receiver = node.child_by_field_name("receiver")?;
                let param = receiver
                    .named_children(&mut receiver.walk())
                    .find(|child| child.kind() == "parameter_declaration")?;
                let receiver_type = param
                    .child_by_field_name("type")
                    .map(|ty| strip_type_parameters(text(ty, source)));
                let receiver_name = param
                    .child_by_field_name("name")
                    .map(|ident| text(ident, source).to_string());
                Some(Self {
                    name,
                    receiver_type,
                    receiver_name,
                })
            }
            _ => None,
        }
    }

    /// `Name` for functions, `(T).Name` or `(*T).Name` for methods.
    fn display_name(&self) -> String {
        match &self.receiver_type {
            Some(receiver) => format!("({}).{}", receiver, self.name),
            None => self.name.clone(),
        }
    }
}

fn strip_type_parameters(receiver: &str) -> String {
    let base = receiver.split('[').next().unwrap_or(receiver);
    base.chars().filter(|c| !c.is_whitespace()).collect()
}

fn logical_operator(node: Node) -> Option<&'static str> {
    if node.kind() != "binary_expression" {
        return None;
    }
    match node.child_by_field_name("operator")?.kind() {
        "&&" => Some("&&"),
        "||" => Some("||"),
        _ => None,
    }
}

// =============================================================================
// Cyclomatic
// =============================================================================

pub(crate) fn cyclomatic_complexity(node: Node) -> u32 {
    let mut complexity = 1;
    visit_node_for_cyclomatic(node, &mut complexity);
    complexity
}

fn visit_node_for_cyclomatic(node: Node, complexity: &mut u32) {
    match node.kind() {
        "if_statement" | "for_statement" => *complexity += 1,
        // default_case is not a decision point
        "expression_case" | "type_case" | "communication_case" => *complexity += 1,
        "binary_expression" if logical_operator(node).is_some() => *complexity += 1,
        _ => {}
    }

    for child in node.children(&mut node.walk()) {
        visit_node_for_cyclomatic(child, complexity);
    }
}

// =============================================================================
// Cognitive
// =============================================================================

fn cognitive_complexity(node: Node, signature: &FunctionSignature, source: &[u8]) -> u32 {
    let mut walker = CognitiveWalker {
        source,
        signature,
        complexity: 0,
    };
    if let Some(body) = node.child_by_field_name("body") {
        walker.walk(body, 0);
    }
    walker.complexity
}

struct CognitiveWalker<'a> {
    source: &'a [u8],
    signature: &'a FunctionSignature,
    complexity: u32,
}

impl CognitiveWalker<'_> {
    fn walk(&mut self, node: Node, nesting: u32) {
        match node.kind() {
            "if_statement" => {
                self.complexity += 1 + nesting;
                self.walk_if(node, nesting);
                return;
            }
            "for_statement"
            | "expression_switch_statement"
            | "type_switch_statement"
            | "select_statement" => {
                self.complexity += 1 + nesting;
                self.walk_nested_bodies(node, nesting);
                return;
            }
            "func_literal" => {
                self.walk_children(node, nesting + 1);
                return;
            }
            "goto_statement" => self.complexity += 1,
            "break_statement" | "continue_statement" if has_label(node) => self.complexity += 1,
            "binary_expression" if is_outermost_logical(node) => {
                self.complexity += logical_sequences(node);
            }
            "call_expression" if self.is_recursive_call(node) => self.complexity += 1,
            _ => {}
        }

        self.walk_children(node, nesting);
    }

    fn walk_children(&mut self, node: Node, nesting: u32) {
        for child in node.children(&mut node.walk()) {
            self.walk(child, nesting);
        }
    }

    /// Condition at the current level, branches one deeper. An `else if`
    /// chain stays at the level of the first `if` and costs one point per link.
    fn walk_if(&mut self, node: Node, nesting: u32) {
        if let Some(init) = node.child_by_field_name("initializer") {
            self.walk(init, nesting);
        }
        if let Some(condition) = node.child_by_field_name("condition") {
            self.walk(condition, nesting);
        }
        if let Some(consequence) = node.child_by_field_name("consequence") {
            self.walk(consequence, nesting + 1);
        }
        if let Some(alternative) = node.child_by_field_name("alternative") {
            self.complexity += 1;
            if alternative.kind() == "if_statement" {
                self.walk_if(alternative, nesting);
            } else {
                self.walk(alternative, nesting + 1);
            }
        }
    }

    fn walk_nested_bodies(&mut self, node: Node, nesting: u32) {
        for child in node.children(&mut node.walk()) {
            let depth = match child.kind() {
                "block" | "expression_case" | "type_case" | "communication_case"
                | "default_case" => nesting + 1,
                _ => nesting,
            };
            self.walk(child, depth);
        }
    }

    fn is_recursive_call(&self, call: Node) -> bool {
        let Some(callee) = call.child_by_field_name("function") else {
            return false;
        };
        let signature = self.signature;

        match callee.kind() {
            "identifier" => {
                signature.receiver_type.is_none() && text(callee, self.source) == signature.name
            }
            "selector_expression" => {
                let (Some(operand), Some(field)) = (
                    callee.child_by_field_name("operand"),
                    callee.child_by_field_name("field"),
                ) else {
                    return false;
                };
                signature.receiver_name.as_deref() == Some(text(operand, self.source))
                    && text(field, self.source) == signature.name
            }
            _ => false,
        }
    }
}

fn has_label(node: Node) -> bool {
    node.children(&mut node.walk())
        .any(|child| child.kind() == "label_name")
}

fn is_outermost_logical(node: Node) -> bool {
    logical_operator(node).is_some()
        && node
            .parent()
            .is_none_or(|parent| parent.kind() != "binary_expression")
}

/// Count runs of identical logical operators, reading the expression left to right.
fn logical_sequences(node: Node) -> u32 {
    let mut operators = Vec::new();
    collect_logical_operators(node, &mut operators);

    let mut runs = 0;
    let mut previous = None;
    for op in operators {
        if previous != Some(op) {
            runs += 1;
            previous = Some(op);
        }
    }
    runs
}

fn collect_logical_operators(node: Node, operators: &mut Vec<&'static str>) {
    if node.kind() != "binary_expression" {
        return;
    }
    if let Some(left) = node.child_by_field_name("left") {
        collect_logical_operators(left, operators);
    }
    if let Some(op) = logical_operator(node) {
        operators.push(op);
    }
    if let Some(right) = node.child_by_field_name("right") {
        collect_logical_operators(right, operators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn score(source: &str, metric: GoMetric) -> Vec<(String, u32)> {
        analyze_source(source, "main.go", metric)
            .unwrap()
            .into_iter()
            .map(|f| (f.name, f.complexity))
            .collect()
    }

    const SAMPLE: &str = indoc! {r#"
        package sample

        func Simple() int {
            return 1
        }

        func Branchy(a, b int) int {
            if a > 0 && b > 0 {
                return 1
            } else if a < 0 || b < 0 {
                return -1
            } else {
                for i := 0; i < a; i++ {
                    b++
                }
            }
            switch a {
            case 1:
                return 2
            case 2:
                return 3
            default:
                return 0
            }
        }
    "#};

    #[test]
    fn test_cyclomatic_counts_decision_points() {
        let scores = score(SAMPLE, GoMetric::Cyclomatic);
        // Branchy: 1 + if + && + else-if + || + for + 2 cases
        assert_eq!(
            scores,
            vec![("Simple".to_string(), 1), ("Branchy".to_string(), 8)]
        );
    }

    #[test]
    fn test_cognitive_applies_nesting() {
        let scores = score(SAMPLE, GoMetric::Cognitive);
        // if(1) &&(1) else-if(1) ||(1) else(1) for nested(2) switch(1)
        assert_eq!(
            scores,
            vec![("Simple".to_string(), 0), ("Branchy".to_string(), 8)]
        );
    }

    #[test]
    fn test_cognitive_logical_sequences() {
        let source = indoc! {r#"
            package p

            func Same(a, b, c bool) bool {
                return a && b && c
            }

            func Mixed(a, b, c, d bool) bool {
                return a && b || c && d
            }
        "#};

        assert_eq!(
            score(source, GoMetric::Cognitive),
            vec![("Same".to_string(), 1), ("Mixed".to_string(), 3)]
        );
    }

    #[test]
    fn test_cognitive_recursion_and_labels() {
        let source = indoc! {r#"
            package p

            func Fact(n int) int {
                if n <= 1 {
                    return 1
                }
                return n * Fact(n-1)
            }

            func Scan(rows [][]int) {
            outer:
                for _, row := range rows {
                    for _, v := range row {
                        if v < 0 {
                            continue outer
                        }
                    }
                }
            }
        "#};

        // Fact: if(1) + recursion(1); Scan: for(1) for(2) if(3) continue-label(1)
        assert_eq!(
            score(source, GoMetric::Cognitive),
            vec![("Fact".to_string(), 2), ("Scan".to_string(), 7)]
        );
    }

    #[test]
    fn test_cognitive_func_literal_increases_nesting() {
        let source = indoc! {r#"
            package p

            func Run(xs []int) {
                f := func(x int) {
                    if x > 0 {
                        println(x)
                    }
                }
                f(1)
            }
        "#};

        assert_eq!(score(source, GoMetric::Cognitive), vec![("Run".to_string(), 2)]);
    }

    #[test]
    fn test_method_names_include_receiver() {
        let source = indoc! {r#"
            package store

            type Cache struct{}
            type List[T any] struct{}

            func (c *Cache) Get(key string) string { return key }
            func (c Cache) Len() int { return 0 }
            func (l *List[T]) Push(v T) {}
        "#};

        let functions = analyze_source(source, "store/cache.go", GoMetric::Cyclomatic).unwrap();
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["(*Cache).Get", "(Cache).Len", "(*List).Push"]);
        assert_eq!(functions[0].packages, vec!["store".to_string()]);
        assert_eq!(functions[0].line, 6);
        assert_eq!(functions[0].length, 1);
    }

    #[test]
    fn test_method_recursion_through_receiver() {
        let source = indoc! {r#"
            package p

            type Node struct{ next *Node }

            func (n *Node) Len() int {
                if n.next == nil {
                    return 1
                }
                return 1 + n.next.Len()
            }

            func (n *Node) Walk() {
                n.Walk()
            }
        "#};

        // `n.next.Len()` has a non-receiver operand, so only Walk counts recursion
        assert_eq!(
            score(source, GoMetric::Cognitive),
            vec![("(*Node).Len".to_string(), 1), ("(*Node).Walk".to_string(), 1)]
        );
    }

    #[test]
    fn test_file_without_functions_is_empty() {
        let source = "package p\n\nconst X = 1\n";
        assert!(analyze_source(source, "x.go", GoMetric::Cyclomatic)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_analyze_repository_walks_and_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("vendor/dep")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        fs::write(
            root.join("pkg/a.go"),
            "package pkg\n\nfunc A(x int) int {\n\tif x > 0 {\n\t\treturn 1\n\t}\n\treturn 0\n}\n",
        )
        .unwrap();
        fs::write(root.join("pkg/types.go"), "package pkg\n\ntype T int\n").unwrap();
        fs::write(root.join("vendor/dep/d.go"), "package dep\n\nfunc D() {}\n").unwrap();
        fs::write(root.join(".git/hook.go"), "package git\n\nfunc H() {}\n").unwrap();
        fs::write(root.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

        let exclude = Regex::new("^vendor/").unwrap();
        let files = analyze_repository(root, GoMetric::Cyclomatic, Some(&exclude)).unwrap();

        let summary: Vec<_> = files.iter().map(|f| (f.path.as_str(), f.average)).collect();
        assert_eq!(summary, vec![("main.go", 1.0), ("pkg/a.go", 2.0)]);
    }
}
