//! Static extraction of story `args`.
//!
//! Values are read structurally from object literals and never evaluated.
//! Spreads of other stories' args (`{ ...Primary.args }`) are merged when
//! the referenced story was already read, and left as unresolved
//! references otherwise until [`ExampleAstExtractor::clean_args`] runs.

use indexmap::IndexMap;
use oxc_ast::ast::{ArrayExpressionElement, Expression, ObjectPropertyKind, UnaryOperator};
use oxc_span::GetSpan;
use rustc_hash::FxHashSet;
use serde_json::Value;

use storymap_graph::args::{arguments_to_json, ArgumentMap, ArgumentValue};
use storymap_graph::BuildContext;

use crate::evaluate::unwrap_type_wrappers;
use crate::names::{expression_kind, expression_name, property_key_name};

/// Property holding the arguments of a story or of the meta.
pub const ARGS_KEY: &str = "args";

/// Key prefix of entries that still point at another story's args.
const SPREAD_KEY_PREFIX: &str = "...";

/// Collects the args of one story file.
#[derive(Debug)]
pub struct ExampleAstExtractor<'s> {
    source: &'s str,
    placeholder_functions: &'s [String],
    ctx: BuildContext,
    meta_args: ArgumentMap,
    story_args: IndexMap<String, ArgumentMap>,
}

impl<'s> ExampleAstExtractor<'s> {
    pub fn new(source: &'s str, placeholder_functions: &'s [String], ctx: &BuildContext) -> Self {
        Self {
            source,
            placeholder_functions,
            ctx: ctx.scoped("args"),
            meta_args: ArgumentMap::new(),
            story_args: IndexMap::new(),
        }
    }

    /// Merge the meta's `args` value.
    pub fn add_meta_args(&mut self, expr: &Expression<'_>) {
        if let Some(args) = self.extract_args(expr) {
            self.meta_args.extend(args);
        }
    }

    /// Merge `expr` into the args of `story`; later keys win.
    pub fn add_story_args(&mut self, story: &str, expr: &Expression<'_>) {
        if let Some(args) = self.extract_args(expr) {
            self.story_args
                .entry(story.to_string())
                .or_default()
                .extend(args);
        }
    }

    /// `story.args = expr`: the assigned value replaces earlier args.
    ///
    /// The right-hand side is read before the replacement, so it may still
    /// spread the story's previous args.
    pub fn set_story_args(&mut self, story: &str, expr: &Expression<'_>) {
        let args = self.extract_args(expr).unwrap_or_default();
        self.story_args.insert(story.to_string(), args);
    }

    pub fn meta_args(&self) -> &ArgumentMap {
        &self.meta_args
    }

    pub fn story_args(&self, story: &str) -> Option<&ArgumentMap> {
        self.story_args.get(story)
    }

    /// Meta args overlaid with the story's own args.
    pub fn merged_args(&self, story: &str) -> ArgumentMap {
        let mut merged = self.meta_args.clone();
        if let Some(own) = self.story_args.get(story) {
            merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Replace remaining `{ ...Other.args }` references with the referenced
    /// story's args.
    ///
    /// Chains are followed; a story that (indirectly) spreads itself keeps
    /// the unresolved reference at the point the cycle closes.
    pub fn clean_args(&mut self) {
        let stories: Vec<String> = self.story_args.keys().cloned().collect();
        for story in stories {
            let mut visiting = FxHashSet::default();
            let cleaned = self.resolved_args(&story, &mut visiting);
            self.story_args.insert(story, cleaned);
        }
    }

    fn resolved_args(&self, story: &str, visiting: &mut FxHashSet<String>) -> ArgumentMap {
        let Some(args) = self.story_args.get(story) else {
            return ArgumentMap::new();
        };
        visiting.insert(story.to_string());

        let mut cleaned = ArgumentMap::new();
        for (key, value) in args {
            let target = value.spread_target().and_then(spread_story);
            match target {
                Some(other) if self.story_args.contains_key(other) && !visiting.contains(other) => {
                    let spliced = self.resolved_args(other, visiting);
                    cleaned.extend(spliced);
                }
                _ => {
                    cleaned.insert(key.clone(), value.clone());
                }
            }
        }

        visiting.remove(story);
        cleaned
    }

    /// Args object of a story or meta.
    ///
    /// A bare reference (`args: Primary.args` or `args: baseArgs`) is treated
    /// like a spread of that reference.
    pub fn extract_args(&self, expr: &Expression<'_>) -> Option<ArgumentMap> {
        match unwrap_type_wrappers(expr) {
            Expression::ObjectExpression(object) => {
                let mut args = ArgumentMap::new();
                for property in &object.properties {
                    match property {
                        ObjectPropertyKind::ObjectProperty(prop) => {
                            let Some(key) = property_key_name(&prop.key, &self.ctx) else {
                                continue;
                            };
                            if let Some(value) = self.extract_value(&prop.value, false) {
                                args.insert(key, value);
                            }
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.add_spread(&mut args, &spread.argument);
                        }
                    }
                }
                Some(args)
            }
            reference @ (Expression::Identifier(_)
            | Expression::StaticMemberExpression(_)
            | Expression::ComputedMemberExpression(_)
            | Expression::ChainExpression(_)) => {
                let mut args = ArgumentMap::new();
                self.add_spread(&mut args, reference);
                Some(args)
            }
            other => {
                self.ctx.unhandled("extract_args", expression_kind(other));
                None
            }
        }
    }

    fn add_spread(&self, args: &mut ArgumentMap, argument: &Expression<'_>) {
        match self.extract_value(argument, true) {
            Some(value) => match value.spread_target() {
                Some(target) => {
                    let known = spread_story(target).and_then(|story| self.story_args.get(story));
                    match known {
                        Some(existing) => {
                            args.extend(existing.iter().map(|(k, v)| (k.clone(), v.clone())));
                        }
                        None => {
                            let key = format!("{SPREAD_KEY_PREFIX}{target}");
                            args.insert(key, value.clone());
                        }
                    }
                }
                None => {
                    // `{ ...{ a: 1 } }`
                    if let ArgumentValue::Object(json) = &value {
                        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(json) {
                            for (key, inner) in map {
                                args.insert(key, json_to_argument(inner));
                            }
                            return;
                        }
                    }
                    self.ctx.unhandled("spread", value.kind());
                }
            },
            None => self.ctx.unhandled("spread", expression_kind(argument)),
        }
    }

    /// Typed value of one property.
    pub fn extract_value(&self, expr: &Expression<'_>, is_spread: bool) -> Option<ArgumentValue> {
        let expr = unwrap_type_wrappers(expr);
        let value = match expr {
            Expression::BooleanLiteral(lit) => ArgumentValue::Boolean(lit.value),
            Expression::NullLiteral(_) => ArgumentValue::Null,
            Expression::NumericLiteral(lit) => ArgumentValue::Number(lit.value),
            Expression::StringLiteral(lit) => ArgumentValue::String(lit.value.to_string()),
            Expression::BigIntLiteral(lit) => {
                let digits: String = self
                    .text(lit.span)
                    .trim_end_matches('n')
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                match digits.parse::<f64>() {
                    Ok(n) => ArgumentValue::Number(n),
                    Err(_) => ArgumentValue::Unknown(self.text(lit.span).to_string()),
                }
            }
            Expression::RegExpLiteral(lit) => {
                let text = self.text(lit.span);
                let pattern = text
                    .strip_prefix('/')
                    .and_then(|rest| rest.rfind('/').map(|end| &rest[..end]))
                    .unwrap_or(text);
                ArgumentValue::String(pattern.to_string())
            }
            Expression::TemplateLiteral(tpl) => ArgumentValue::String(
                tpl.quasis
                    .iter()
                    .map(|quasi| quasi.value.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Expression::UnaryExpression(unary) => match &unary.argument {
                Expression::NumericLiteral(lit)
                    if unary.operator == UnaryOperator::UnaryNegation =>
                {
                    ArgumentValue::Number(-lit.value)
                }
                _ => self.unknown(expr),
            },
            Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
                ArgumentValue::Function
            }
            Expression::CallExpression(call) => {
                let callee = expression_name(&call.callee, &self.ctx);
                let is_placeholder = callee
                    .as_deref()
                    .is_some_and(|name| self.placeholder_functions.iter().any(|p| p == name));
                if is_placeholder {
                    ArgumentValue::Function
                } else {
                    ArgumentValue::Unknown(self.text(call.span).to_string())
                }
            }
            Expression::Identifier(_)
            | Expression::StaticMemberExpression(_)
            | Expression::ComputedMemberExpression(_)
            | Expression::PrivateFieldExpression(_)
            | Expression::ChainExpression(_)
            | Expression::ThisExpression(_) => {
                let name = expression_name(expr, &self.ctx)?;
                if is_spread {
                    ArgumentValue::spread_of(name)
                } else {
                    ArgumentValue::reference(name)
                }
            }
            Expression::ObjectExpression(_) => {
                let args = self.extract_args(expr)?;
                ArgumentValue::Object(arguments_to_json(&args).to_string())
            }
            Expression::ArrayExpression(array) => {
                let items: Vec<Value> = array
                    .elements
                    .iter()
                    .filter_map(|element| match element {
                        ArrayExpressionElement::Elision(_) => Some(Value::Null),
                        ArrayExpressionElement::SpreadElement(spread) => {
                            self.ctx.unhandled("array element", "SpreadElement");
                            Some(Value::String(self.text(spread.span).to_string()))
                        }
                        other => other
                            .as_expression()
                            .and_then(|e| self.extract_value(e, false))
                            .map(|v| v.to_json()),
                    })
                    .collect();
                ArgumentValue::Object(Value::Array(items).to_string())
            }
            Expression::JSXElement(_) | Expression::JSXFragment(_) => {
                ArgumentValue::Jsx(self.text(expr.span()).to_string())
            }
            _ => self.unknown(expr),
        };
        Some(value)
    }

    fn unknown(&self, expr: &Expression<'_>) -> ArgumentValue {
        self.ctx.unhandled("extract_value", expression_kind(expr));
        ArgumentValue::Unknown(self.text(expr.span()).to_string())
    }

    fn text(&self, span: oxc_span::Span) -> &'s str {
        span.source_text(self.source)
    }
}

/// Story named by a spread target of the form `Story.args` or `Story?.args`.
fn spread_story(target: &str) -> Option<&str> {
    let (story, property) = target.split_once('.')?;
    (property == ARGS_KEY).then(|| story.strip_suffix('?').unwrap_or(story))
}

fn json_to_argument(value: Value) -> ArgumentValue {
    match value {
        Value::Null => ArgumentValue::Null,
        Value::Bool(b) => ArgumentValue::Boolean(b),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| ArgumentValue::Unknown(n.to_string()), ArgumentValue::Number),
        Value::String(s) => ArgumentValue::String(s),
        other => ArgumentValue::Object(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::assignment_target_name;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::Statement;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    /// Extract the args of `x = <expr>;` statements in order, naming each
    /// story after its assignment target.
    fn extract(source: &str) -> ExampleAstExtractor<'_> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        let placeholders: &'static [String] = Box::leak(vec!["fn".to_string()].into_boxed_slice());
        let ctx = BuildContext::new(true);
        let mut extractor = ExampleAstExtractor::new(source, placeholders, &ctx);
        for stmt in &ret.program.body {
            let Statement::ExpressionStatement(stmt) = stmt else {
                continue;
            };
            let Expression::AssignmentExpression(assign) = &stmt.expression else {
                continue;
            };
            let Some(name) = assignment_target_name(&assign.left, &ctx) else {
                continue;
            };
            if name == "meta" {
                extractor.add_meta_args(&assign.right);
            } else {
                extractor.add_story_args(&name, &assign.right);
            }
        }
        extractor
    }

    #[test]
    fn literal_kinds() {
        let extractor = extract(
            r#"Primary = {
                label: "Click", size: 2, big: 10n, on: true, none: null,
                pattern: /ab+c/i, text: `a${x}b`, onClick: fn(), onHover: () => {},
                compute: format(1), theme: themes.dark, icon: <Icon />,
                style: { color: "red" }, list: [1, "a"], negative: -1,
                render() { return null; }
            };"#,
        );
        let args = extractor.story_args("Primary").unwrap();
        assert_eq!(args["label"], ArgumentValue::String("Click".into()));
        assert_eq!(args["size"], ArgumentValue::Number(2.0));
        assert_eq!(args["big"], ArgumentValue::Number(10.0));
        assert_eq!(args["on"], ArgumentValue::Boolean(true));
        assert_eq!(args["none"], ArgumentValue::Null);
        assert_eq!(args["pattern"], ArgumentValue::String("ab+c".into()));
        assert_eq!(args["text"], ArgumentValue::String("a b".into()));
        assert_eq!(args["onClick"], ArgumentValue::Function);
        assert_eq!(args["onHover"], ArgumentValue::Function);
        assert_eq!(args["compute"], ArgumentValue::Unknown("format(1)".into()));
        assert_eq!(args["theme"], ArgumentValue::reference("themes.dark"));
        assert_eq!(args["icon"], ArgumentValue::Jsx("<Icon />".into()));
        assert_eq!(args["style"], ArgumentValue::Object(r#"{"color":"red"}"#.into()));
        assert_eq!(args["list"], ArgumentValue::Object(r#"[1,"a"]"#.into()));
        assert_eq!(args["negative"], ArgumentValue::Number(-1.0));
        assert_eq!(args["render"], ArgumentValue::Function);
    }

    #[test]
    fn spreads_of_earlier_stories_merge_immediately() {
        let extractor = extract(
            r#"
            Primary = { label: "A", size: "s" };
            Secondary = { ...Primary.args, label: "B" };
            "#,
        );
        let args = extractor.story_args("Secondary").unwrap();
        assert_eq!(args["label"], ArgumentValue::String("B".into()));
        assert_eq!(args["size"], ArgumentValue::String("s".into()));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn forward_spreads_resolve_on_clean() {
        let mut extractor = extract(
            r#"
            Secondary = { ...Primary.args, label: "B" };
            Tertiary = Secondary.args;
            Primary = { label: "A", size: "s" };
            "#,
        );
        let before = extractor.story_args("Secondary").unwrap();
        assert_eq!(
            before["...Primary.args"],
            ArgumentValue::spread_of("Primary.args")
        );

        extractor.clean_args();
        let secondary = extractor.story_args("Secondary").unwrap();
        assert_eq!(secondary["label"], ArgumentValue::String("B".into()));
        assert_eq!(secondary["size"], ArgumentValue::String("s".into()));

        let tertiary = extractor.story_args("Tertiary").unwrap();
        assert_eq!(tertiary, secondary);
    }

    #[test]
    fn self_references_stay_unresolved() {
        let mut extractor = extract(
            r#"
            A = { ...B.args, a: 1 };
            B = { ...A.args, b: 2 };
            Loop = { ...Loop.args };
            Base = { ...baseArgs };
            "#,
        );
        extractor.clean_args();

        // B copied A (with its pending spread of B) when it was read.
        let a = extractor.story_args("A").unwrap();
        assert_eq!(a["a"], ArgumentValue::Number(1.0));
        assert_eq!(a["b"], ArgumentValue::Number(2.0));
        assert_eq!(a["...B.args"], ArgumentValue::spread_of("B.args"));

        let looped = extractor.story_args("Loop").unwrap();
        assert_eq!(looped["...Loop.args"], ArgumentValue::spread_of("Loop.args"));

        let base = extractor.story_args("Base").unwrap();
        assert_eq!(base["...baseArgs"], ArgumentValue::spread_of("baseArgs"));
    }

    #[test]
    fn meta_args_are_overridden_by_story_args() {
        let extractor = extract(
            r#"
            meta = { size: "m", variant: "primary" };
            Small = { size: "s" };
            "#,
        );
        let merged = extractor.merged_args("Small");
        assert_eq!(merged["size"], ArgumentValue::String("s".into()));
        assert_eq!(merged["variant"], ArgumentValue::String("primary".into()));
        assert_eq!(extractor.merged_args("Missing"), *extractor.meta_args());
    }

    #[test]
    fn spread_story_names() {
        assert_eq!(spread_story("Primary.args"), Some("Primary"));
        assert_eq!(spread_story("Primary?.args"), Some("Primary"));
        assert_eq!(spread_story("Primary.argTypes"), None);
        assert_eq!(spread_story("a.b.args"), None);
        assert_eq!(spread_story("baseArgs"), None);
    }
}
