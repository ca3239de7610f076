//! Component Story Format reader.
//!
//! Turns each story file of the program into an [`ExampleRecord`]: the
//! meta (`export default { title, component, args, ... }`), the named story
//! exports with their merged args, and the resolved path of the component
//! the stories document.

mod extractor;
mod ids;

pub use extractor::{ExampleAstExtractor, ARGS_KEY};
pub use ids::{sanitize, start_case, story_id};

use std::time::Instant;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrayExpressionElement, BindingPatternKind, Declaration, Expression, ObjectExpression,
    ObjectPropertyKind, Program, Statement, VariableDeclaration,
};
use oxc_span::GetSpan;
use rustc_hash::FxHashMap;

use storymap_graph::context::format_elapsed;
use storymap_graph::{
    BuildContext, DiagnosticKind, ExampleCatalog, ExampleEntry, ExampleFilter, ExampleRecord,
};

use crate::evaluate::unwrap_type_wrappers;
use crate::module_syntax::{collect_bindings, module_export_name, ImportedName, ModuleBindings};
use crate::names::{assignment_target_name, expression_name, property_key_name};
use crate::program::SourceFile;
use crate::resolver::ModuleResolver;

/// Title used when neither the meta nor the file name provide one.
pub const MISSING_TITLE: &str = "[[Missing Story Title]]";

/// Exports with this prefix are internal helpers, never stories.
const PRIVATE_EXPORT_PREFIX: &str = "__";

/// One story export found in a file, in declaration order.
#[derive(Debug)]
struct StoryExport {
    export: String,
    name: Option<String>,
}

/// Meta fields read from the default export.
#[derive(Debug, Default)]
struct Meta {
    title: Option<String>,
    id: Option<String>,
    tags: Vec<String>,
    component: Option<String>,
    include: ExampleFilter,
    exclude: ExampleFilter,
}

/// Reads story files into [`ExampleRecord`]s.
#[derive(Debug)]
pub struct StoryReader<'r> {
    resolver: &'r ModuleResolver<'r>,
    placeholder_functions: &'r [String],
    ctx: BuildContext,
}

impl<'r> StoryReader<'r> {
    pub fn new(
        resolver: &'r ModuleResolver<'r>,
        placeholder_functions: &'r [String],
        ctx: &BuildContext,
    ) -> Self {
        Self {
            resolver,
            placeholder_functions,
            ctx: ctx.scoped("stories"),
        }
    }

    /// Read every story file of the program.
    pub fn read_catalog(&self) -> ExampleCatalog {
        let start = Instant::now();
        let records: Vec<ExampleRecord> = self
            .resolver
            .program()
            .story_files()
            .filter_map(|file| self.read(file))
            .collect();

        self.ctx.info(format!(
            "Read {} story file(s) in {}",
            records.len(),
            format_elapsed(start.elapsed())
        ));
        ExampleCatalog::new(records)
    }

    /// Read one story file. `None` when the file has no CSF meta.
    pub fn read(&self, file: &SourceFile) -> Option<ExampleRecord> {
        let allocator = Allocator::default();
        let program = file.parse(&allocator, &self.ctx);
        let source = file.text.as_str();

        let consts = top_level_consts(&program);
        let Some(meta_object) = find_meta(&program, &consts) else {
            self.ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!("No CSF meta export in {}", file.path.display()),
            );
            return None;
        };

        let mut extractor =
            ExampleAstExtractor::new(source, self.placeholder_functions, &self.ctx);
        let meta = self.read_meta(meta_object, source, &mut extractor);
        let stories = self.read_stories(&program, &consts, &mut extractor);
        extractor.clean_args();

        let mut record = ExampleRecord::new(&file.path);
        if let Some(component) = &meta.component {
            let bindings = collect_bindings(&program);
            self.apply_component(&mut record, component, &bindings, file);
        } else {
            self.ctx.verbose(format!(
                "No component in the meta of {}",
                file.path.display()
            ));
        }

        let title = meta.title.clone().unwrap_or_else(|| title_from_file_name(file));
        let kind = meta.id.clone().unwrap_or_else(|| title.clone());
        record.entries = stories
            .into_iter()
            .map(|story| ExampleEntry {
                name: story.name.unwrap_or_else(|| start_case(&story.export)),
                story_id: story_id(&kind, &start_case(&story.export)),
                args: extractor.merged_args(&story.export),
                id: story.export,
            })
            .collect();
        record.id = meta.id;
        record.title = title;
        record.tags = meta.tags;
        record.include = meta.include;
        record.exclude = meta.exclude;

        self.ctx.verbose(format!(
            "{}: {} stor(y/ies) for {}",
            file.path.display(),
            record.entries.len(),
            record.component_alias
        ));
        Some(record)
    }

    fn read_meta(
        &self,
        meta: &ObjectExpression<'_>,
        source: &str,
        extractor: &mut ExampleAstExtractor<'_>,
    ) -> Meta {
        let mut out = Meta::default();

        for property in &meta.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = property else {
                self.ctx.unhandled("meta", "SpreadProperty");
                continue;
            };
            let Some(key) = property_key_name(&prop.key, &self.ctx) else {
                continue;
            };

            match key.as_str() {
                "title" => out.title = string_value(&prop.value),
                "id" => out.id = string_value(&prop.value),
                "tags" => out.tags = string_list(&prop.value).unwrap_or_default(),
                "component" => {
                    out.component = expression_name(unwrap_type_wrappers(&prop.value), &self.ctx);
                }
                ARGS_KEY => extractor.add_meta_args(&prop.value),
                "includeStories" => out.include = self.story_filter(&prop.value, source),
                "excludeStories" => out.exclude = self.story_filter(&prop.value, source),
                _ => {}
            }
        }

        out
    }

    /// `includeStories` / `excludeStories`: a list of export names or a
    /// regular expression literal.
    fn story_filter(&self, expr: &Expression<'_>, source: &str) -> ExampleFilter {
        let expr = unwrap_type_wrappers(expr);
        if let Some(names) = string_list(expr) {
            return ExampleFilter::names(names);
        }

        let Expression::RegExpLiteral(lit) = expr else {
            self.ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!(
                    "Story filter must be an array or a regular expression, got {}",
                    lit_text(expr, source)
                ),
            );
            return ExampleFilter::Empty;
        };

        let text = lit.span.source_text(source);
        let (pattern, flags) = split_regex_literal(text);
        let pattern = if flags.contains('i') {
            format!("(?i){pattern}")
        } else {
            pattern.to_string()
        };

        ExampleFilter::pattern(&pattern).unwrap_or_else(|err| {
            self.ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!("Unsupported story filter {text}: {err}"),
            );
            ExampleFilter::Empty
        })
    }

    /// Story exports in source order, feeding their args to `extractor`.
    fn read_stories(
        &self,
        program: &Program<'_>,
        consts: &FxHashMap<String, &Expression<'_>>,
        extractor: &mut ExampleAstExtractor<'_>,
    ) -> Vec<StoryExport> {
        let mut stories: Vec<StoryExport> = Vec::new();

        for stmt in &program.body {
            match stmt {
                Statement::ExportNamedDeclaration(named) if named.source.is_none() => {
                    match &named.declaration {
                        Some(Declaration::VariableDeclaration(var)) => {
                            for (export, init) in declarators(var) {
                                if let Some(story) = self.story_export(export, init, extractor) {
                                    stories.push(story);
                                }
                            }
                        }
                        Some(Declaration::FunctionDeclaration(func)) => {
                            if let Some(id) = &func.id {
                                if let Some(story) = self.story_export(&id.name, None, extractor) {
                                    stories.push(story);
                                }
                            }
                        }
                        Some(_) => {}
                        None => {
                            for spec in &named.specifiers {
                                let exported = module_export_name(&spec.exported);
                                let local = module_export_name(&spec.local);
                                let init = consts.get(&local).copied();
                                if let Some(story) = self.story_export(&exported, init, extractor) {
                                    stories.push(story);
                                }
                            }
                        }
                    }
                }
                // CSF2: `Primary.args = {...}`, `Primary.storyName = "..."`.
                Statement::ExpressionStatement(expr_stmt) => {
                    let Expression::AssignmentExpression(assign) = &expr_stmt.expression else {
                        continue;
                    };
                    let Some(target) = assignment_target_name(&assign.left, &self.ctx) else {
                        continue;
                    };
                    let Some((story, property)) = target.split_once('.') else {
                        continue;
                    };
                    let Some(known) = stories.iter_mut().find(|s| s.export == story) else {
                        continue;
                    };
                    match property {
                        ARGS_KEY => extractor.set_story_args(story, &assign.right),
                        "storyName" => known.name = string_value(&assign.right),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        stories
    }

    fn story_export(
        &self,
        export: &str,
        init: Option<&Expression<'_>>,
        extractor: &mut ExampleAstExtractor<'_>,
    ) -> Option<StoryExport> {
        if export.starts_with(PRIVATE_EXPORT_PREFIX) {
            return None;
        }

        let mut story = StoryExport {
            export: export.to_string(),
            name: None,
        };

        // CSF3 object stories carry `args` and `name` inline.
        if let Some(Expression::ObjectExpression(object)) = init.map(unwrap_type_wrappers) {
            for property in &object.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = property else {
                    continue;
                };
                match property_key_name(&prop.key, &self.ctx).as_deref() {
                    Some(ARGS_KEY) => extractor.add_story_args(export, &prop.value),
                    Some("name" | "storyName") => story.name = string_value(&prop.value),
                    _ => {}
                }
            }
        }

        Some(story)
    }

    /// Fill in the component name, alias and resolved path from the import
    /// that binds the meta's `component`.
    fn apply_component(
        &self,
        record: &mut ExampleRecord,
        component: &str,
        bindings: &ModuleBindings,
        file: &SourceFile,
    ) {
        let (local_root, member) = match component.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (component, None),
        };

        record.component_alias = component.to_string();
        let Some(import) = bindings.import_for_local(local_root) else {
            // Declared in the story file itself.
            record.component_name = component.to_string();
            self.ctx.verbose(format!(
                "Component {component} is not imported in {}",
                file.path.display()
            ));
            return;
        };

        record.component_name = match (&import.imported, member) {
            // `import * as UI from './ui'` with `component: UI.Button`
            (ImportedName::Namespace, Some(member)) => member.to_string(),
            (imported, _) => imported.export_name().to_string(),
        };

        match self.resolver.resolve_from_file(&import.source, &file.path) {
            Ok(path) => record.component_path = Some(path),
            Err(err) => self.ctx.warn(
                DiagnosticKind::Resolution,
                format!("Component of {}: {err}", file.path.display()),
            ),
        }
    }
}

fn declarators<'v, 'a>(
    var: &'v VariableDeclaration<'a>,
) -> impl Iterator<Item = (&'v str, Option<&'v Expression<'a>>)> {
    var.declarations
        .iter()
        .filter_map(|decl| match &decl.id.kind {
            BindingPatternKind::BindingIdentifier(ident) => {
                Some((ident.name.as_str(), decl.init.as_ref()))
            }
            _ => None,
        })
}

/// Initializers of top-level `const`/`let` declarations, exported or not.
fn top_level_consts<'p, 'a>(program: &'p Program<'a>) -> FxHashMap<String, &'p Expression<'a>> {
    let mut consts = FxHashMap::default();
    for stmt in &program.body {
        let var = match stmt {
            Statement::VariableDeclaration(var) => var,
            Statement::ExportNamedDeclaration(named) => match &named.declaration {
                Some(Declaration::VariableDeclaration(var)) => var,
                _ => continue,
            },
            _ => continue,
        };
        for (name, init) in declarators(var) {
            if let Some(init) = init {
                consts.insert(name.to_string(), init);
            }
        }
    }
    consts
}

/// The object literal of `export default {...}`, directly or through a
/// `const meta = {...}; export default meta;` binding.
fn find_meta<'p, 'a>(
    program: &'p Program<'a>,
    consts: &FxHashMap<String, &'p Expression<'a>>,
) -> Option<&'p ObjectExpression<'a>> {
    let declared = program.body.iter().find_map(|stmt| match stmt {
        Statement::ExportDefaultDeclaration(default) => default.declaration.as_expression(),
        _ => None,
    })?;

    let expr = match unwrap_type_wrappers(declared) {
        Expression::Identifier(ident) => {
            unwrap_type_wrappers(consts.get(ident.name.as_str()).copied()?)
        }
        other => other,
    };
    match expr {
        Expression::ObjectExpression(object) => Some(object),
        _ => None,
    }
}

/// Static string value: string literals and templates without expressions.
fn string_value(expr: &Expression<'_>) -> Option<String> {
    match unwrap_type_wrappers(expr) {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => Some(
            tpl.quasis
                .iter()
                .map(|quasi| quasi.value.raw.as_str())
                .collect(),
        ),
        _ => None,
    }
}

/// Array of static strings; other elements are skipped.
fn string_list(expr: &Expression<'_>) -> Option<Vec<String>> {
    let Expression::ArrayExpression(array) = unwrap_type_wrappers(expr) else {
        return None;
    };
    Some(
        array
            .elements
            .iter()
            .filter_map(ArrayExpressionElement::as_expression)
            .filter_map(string_value)
            .collect(),
    )
}

/// `/pattern/flags` into its two parts.
fn split_regex_literal(text: &str) -> (&str, &str) {
    text.strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
        .unwrap_or((text, ""))
}

fn lit_text<'s>(expr: &Expression<'_>, source: &'s str) -> &'s str {
    expr.span().source_text(source)
}

/// `Button.stories.tsx` -> `Button`.
fn title_from_file_name(file: &SourceFile) -> String {
    file.path
        .file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| MISSING_TITLE.to_string())
}
