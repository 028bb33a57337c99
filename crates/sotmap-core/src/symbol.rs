//! Identifier grammar: parsing, descriptor shapes, and name derivations.
//!
//! Index identifiers are space-separated 5-tuples:
//!
//! ```text
//! <scheme> <manager> <package> <version> <descriptor>
//! ```
//!
//! The descriptor alone encodes an entity's structural shape through suffix
//! and infix conventions:
//!
//! ```text
//! <descriptor> := <path> "#"                       type (class/interface/trait/enum)
//!               | <path> "#" <name> "()."          method
//!               | <path> "()."                     file-level function
//!               | <path> "#$" <name> "."           property
//!               | <path> "#" <name> "."            const or enum case
//!               | <owner> ".(" ["$"] <name> ")"    argument of <owner>
//! <name>       := [a-zA-Z_][a-zA-Z0-9_]*
//! ```
//!
//! Descriptors form an implicit tree: every non-top-level descriptor embeds
//! its parent's descriptor as a prefix, which [`parent_identifier`] exploits
//! for containment. All derivations (kind, display name, FQN, parent) are
//! pure functions over the parsed [`DescriptorShape`].

use winnow::combinator::{delimited, opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};
use winnow::ModalResult;

use crate::graph::NodeKind;

// ============================================================================
// Identifier Parsing
// ============================================================================

/// A parsed index identifier.
///
/// Identifiers with fewer than five space-separated tokens are unparseable
/// by construction; [`Symbol::parse`] returns `None` and callers drop the
/// entity rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub scheme: String,
    pub manager: String,
    pub package: String,
    pub version: String,
    /// Remainder after the version token; may itself contain spaces.
    pub descriptor: String,
}

impl Symbol {
    /// Split an identifier into its five components.
    pub fn parse(identifier: &str) -> Option<Symbol> {
        let mut tokens = identifier.splitn(5, ' ');
        Some(Symbol {
            scheme: tokens.next()?.to_string(),
            manager: tokens.next()?.to_string(),
            package: tokens.next()?.to_string(),
            version: tokens.next()?.to_string(),
            descriptor: tokens.next()?.to_string(),
        })
    }

    /// Parse this identifier's descriptor into its structural shape.
    pub fn shape(&self) -> Option<DescriptorShape> {
        DescriptorShape::parse(&self.descriptor)
    }
}

// ============================================================================
// Occurrence Roles
// ============================================================================

/// A single occurrence role bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SymbolRole {
    Definition = 0x1,
    Import = 0x2,
    WriteAccess = 0x4,
    ReadAccess = 0x8,
    Generated = 0x10,
    Test = 0x20,
    ForwardDefinition = 0x40,
}

/// Occurrence role bitmask as recorded in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolRoles(pub u32);

impl SymbolRoles {
    /// Decode the signed wire value.
    pub fn from_bits(bits: i32) -> SymbolRoles {
        SymbolRoles(bits as u32)
    }

    /// True when `role` is set.
    pub fn has(&self, role: SymbolRole) -> bool {
        self.0 & role as u32 != 0
    }

    /// True when the definition bit is set. This is the only role that
    /// affects graph construction.
    pub fn is_definition(&self) -> bool {
        self.has(SymbolRole::Definition)
    }

    /// Role names for diagnostics; an empty mask reads as a plain reference.
    pub fn names(&self) -> Vec<&'static str> {
        const ALL: [(SymbolRole, &str); 7] = [
            (SymbolRole::Definition, "Definition"),
            (SymbolRole::Import, "Import"),
            (SymbolRole::WriteAccess, "WriteAccess"),
            (SymbolRole::ReadAccess, "ReadAccess"),
            (SymbolRole::Generated, "Generated"),
            (SymbolRole::Test, "Test"),
            (SymbolRole::ForwardDefinition, "ForwardDefinition"),
        ];
        let names: Vec<&'static str> = ALL
            .iter()
            .filter(|(role, _)| self.has(*role))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            vec!["Reference"]
        } else {
            names
        }
    }
}

// ============================================================================
// Descriptor Shapes
// ============================================================================

/// Structural shape of a descriptor.
///
/// Stored fields keep the descriptor's own spelling (`()` suffixes on
/// method members, `$` sigils on properties) so FQNs rebuild exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorShape {
    /// `owner.($name)` or `owner.(name)`: argument of a callable.
    Argument { owner: String, name: String },
    /// `Type#name().`: method on a type.
    Method { type_path: String, member: String },
    /// `path/name().`: file-level function.
    Function { path: String },
    /// `Type#$name.`: property on a type.
    Property { type_path: String, member: String },
    /// `Type#NAME.`: const or enum case, disambiguated by the parent kind.
    Member { type_path: String, member: String },
    /// `path/Type#`: type declaration.
    Type { path: String },
}

impl DescriptorShape {
    /// Match a descriptor against the shape conventions, most specific
    /// first (arguments nest inside method suffixes, so they win).
    ///
    /// Returns `None` for descriptors matching no convention; builders
    /// drop those entities silently.
    pub fn parse(descriptor: &str) -> Option<DescriptorShape> {
        let trimmed = descriptor.trim_end_matches('.');

        if let Some((owner, name)) = split_argument_suffix(trimmed) {
            return Some(DescriptorShape::Argument {
                owner: owner.to_string(),
                name,
            });
        }

        if descriptor.ends_with("().") {
            return match trimmed.split_once('#') {
                Some((type_path, member)) => Some(DescriptorShape::Method {
                    type_path: type_path.to_string(),
                    member: member.to_string(),
                }),
                None => Some(DescriptorShape::Function {
                    path: trimmed.to_string(),
                }),
            };
        }

        if descriptor.contains("#$") {
            let (type_path, member) = trimmed.split_once('#')?;
            return Some(DescriptorShape::Property {
                type_path: type_path.to_string(),
                member: member.to_string(),
            });
        }

        if let Some(path) = descriptor.strip_suffix('#') {
            return Some(DescriptorShape::Type {
                path: path.to_string(),
            });
        }

        if let Some((type_path, member)) = trimmed.split_once('#') {
            if !member.is_empty()
                && !member.starts_with('$')
                && !member.contains('(')
                && !member.contains('.')
            {
                return Some(DescriptorShape::Member {
                    type_path: type_path.to_string(),
                    member: member.to_string(),
                });
            }
        }

        None
    }

    /// Classify into a node kind.
    ///
    /// `docs` are the entity's own documentation lines (type shapes
    /// sub-classify on a leading declaration keyword); `parent_is_enum`
    /// disambiguates const vs. enum case for member shapes.
    pub fn classify(&self, docs: &[String], parent_is_enum: bool) -> NodeKind {
        match self {
            DescriptorShape::Argument { .. } => NodeKind::Argument,
            DescriptorShape::Method { .. } => NodeKind::Method,
            DescriptorShape::Function { .. } => NodeKind::Function,
            DescriptorShape::Property { .. } => NodeKind::Property,
            DescriptorShape::Type { .. } => match type_keyword_from_docs(docs) {
                Some(TypeKeyword::Interface) => NodeKind::Interface,
                Some(TypeKeyword::Trait) => NodeKind::Trait,
                Some(TypeKeyword::Enum) => NodeKind::Enum,
                Some(TypeKeyword::Class) | None => NodeKind::Class,
            },
            DescriptorShape::Member { .. } => {
                if parent_is_enum {
                    NodeKind::EnumCase
                } else {
                    NodeKind::Const
                }
            }
        }
    }

    /// Short display name: final path segment for types, bare member name
    /// for callables, sigil-prefixed name for properties and arguments.
    pub fn display_name(&self) -> String {
        match self {
            DescriptorShape::Argument { name, .. } => name.clone(),
            DescriptorShape::Method { member, .. }
            | DescriptorShape::Property { member, .. }
            | DescriptorShape::Member { member, .. } => {
                member.trim_end_matches(['(', ')']).to_string()
            }
            DescriptorShape::Function { path } => last_path_segment(path)
                .trim_end_matches(['#', '(', ')'])
                .to_string(),
            DescriptorShape::Type { path } => last_path_segment(path).to_string(),
        }
    }

    /// Fully-qualified name with `/` rewritten to the namespace separator.
    ///
    /// Members keep their descriptor spelling (`getId()`, `$name`, `STATUS`)
    /// after the `::` separator; an argument's FQN extends its owning
    /// callable's FQN.
    pub fn fqn(&self) -> String {
        match self {
            DescriptorShape::Argument { owner, name } => {
                format!("{}::{}", descriptor_fqn(owner), name)
            }
            DescriptorShape::Method { type_path, member }
            | DescriptorShape::Property { type_path, member }
            | DescriptorShape::Member { type_path, member } => {
                format!("{}::{}", type_path.replace('/', "\\"), member)
            }
            DescriptorShape::Function { path } | DescriptorShape::Type { path } => {
                path.replace('/', "\\")
            }
        }
    }
}

/// Total FQN derivation for any descriptor string, including owner
/// prefixes that are not complete descriptors on their own.
fn descriptor_fqn(descriptor: &str) -> String {
    let trimmed = descriptor.trim_end_matches('.');

    if let Some((owner, name)) = split_argument_suffix(trimmed) {
        return format!("{}::{}", descriptor_fqn(owner), name);
    }

    match trimmed.split_once('#') {
        Some((type_path, member)) => {
            let type_path = type_path.replace('/', "\\");
            if member.is_empty() {
                type_path
            } else {
                format!("{}::{}", type_path, member)
            }
        }
        None => trimmed.replace('/', "\\"),
    }
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ============================================================================
// Parent Derivation
// ============================================================================

/// Derive the parent identifier for containment, or `None` for top-level
/// entities (contained by their file).
///
/// The parent identifier is the original identifier with only its final
/// descriptor token replaced:
/// - argument `owner.($name)` → `owner.`
/// - member `path#suffix` (non-empty suffix) → `path#`
pub fn parent_identifier(identifier: &str) -> Option<String> {
    if identifier.splitn(5, ' ').count() < 5 {
        return None;
    }
    let (head, descriptor) = identifier.rsplit_once(' ')?;

    // Argument parents keep the owning callable's trailing dot.
    if let Some((owner, _)) = split_argument_suffix(descriptor) {
        return Some(format!("{} {}.", head, owner));
    }

    if let Some(hash_idx) = descriptor.find('#') {
        let suffix = &descriptor[hash_idx + 1..];
        if !suffix.is_empty() && suffix != "#" {
            return Some(format!("{} {}", head, &descriptor[..hash_idx + 1]));
        }
    }

    None
}

// ============================================================================
// Documentation Keywords
// ============================================================================

/// Type declaration keyword found in documentation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Class,
    Interface,
    Trait,
    Enum,
}

/// Scan documentation lines for a leading type-declaration keyword.
///
/// Code fences are stripped and whitespace collapsed before matching; the
/// first line carrying a keyword decides.
pub fn type_keyword_from_docs(docs: &[String]) -> Option<TypeKeyword> {
    for doc in docs {
        let cleaned = doc.replace("```php", "").replace("```", "");
        let cleaned = cleaned.to_lowercase();
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        if cleaned.starts_with("interface ") {
            return Some(TypeKeyword::Interface);
        }
        if cleaned.starts_with("trait ") {
            return Some(TypeKeyword::Trait);
        }
        if cleaned.starts_with("enum ") {
            return Some(TypeKeyword::Enum);
        }
        if cleaned.starts_with("class ")
            || cleaned.starts_with("abstract class ")
            || cleaned.starts_with("final class ")
        {
            return Some(TypeKeyword::Class);
        }
    }
    None
}

// ============================================================================
// Trace Display Names
// ============================================================================

/// Display name for a runtime value.
///
/// Prefers the name embedded in the owning identifier (parameter, local,
/// property conventions, in that order), then falls back to a placeholder
/// keyed on the recorded value kind.
pub fn value_display_name(identifier: Option<&str>, kind: Option<&str>) -> String {
    if let Some(identifier) = identifier.filter(|s| !s.is_empty()) {
        if identifier.contains(".($") {
            if let Some(name) = first_argument_name(identifier) {
                return format!("${}", name);
            }
        }
        if identifier.contains(".local$") {
            if let Some(name) = local_name(identifier) {
                return format!("${}", name);
            }
        }
        if identifier.contains("#$") {
            if let Some(name) = trailing_property_name(identifier) {
                return format!("${}", name);
            }
        }
    }

    match kind {
        Some("result") => "(result)".to_string(),
        Some("literal") => "(literal)".to_string(),
        Some("constant") => "(constant)".to_string(),
        _ => "$unknown".to_string(),
    }
}

/// Display name for a call site.
///
/// Callable callees render as `name()`, property fetches as the bare name;
/// constructors without a usable callee synthesize `new Type()` from the
/// declared return type.
pub fn call_display_name(
    callee: Option<&str>,
    kind: Option<&str>,
    return_type: Option<&str>,
) -> String {
    let kind = kind.unwrap_or("");

    if let Some(callee) = callee.filter(|s| !s.is_empty()) {
        if let Some(name) = trailing_callable_name(callee) {
            if matches!(kind, "method" | "method_static" | "function" | "constructor") {
                return format!("{}()", name);
            }
            return name.to_string();
        }
        if let Some(name) = trailing_member_name(callee) {
            return name.to_string();
        }
    }

    if kind == "constructor" {
        if let Some(type_name) = return_type.and_then(trailing_type_name) {
            return format!("new {}()", type_name);
        }
    }

    "(call)".to_string()
}

/// Rewrite an identifier (or bare descriptor) into display-FQN form for
/// trace entities: namespace separators, `::` member access, trailing
/// punctuation stripped.
pub fn scope_fqn(identifier: &str) -> String {
    let descriptor = match Symbol::parse(identifier) {
        Some(symbol) => symbol.descriptor,
        None => identifier.to_string(),
    };

    let rewritten = descriptor.replace('/', "\\");
    let rewritten = rewritten.trim_end_matches('.');

    // Method suffix: `#name()` renders as `::name()`.
    if let Some(stripped) = rewritten.strip_suffix("()") {
        if let Some((start, name)) = trailing_ident(stripped) {
            if stripped[..start].ends_with('#') {
                return format!("{}::{}()", &stripped[..start - 1], name);
            }
        }
    }

    // Property suffix: `#$name` renders as `::$name`.
    if let Some((start, name)) = trailing_ident(rewritten) {
        if rewritten[..start].ends_with("#$") {
            return format!("{}::${}", &rewritten[..start - 2], name);
        }
    }

    rewritten.trim_end_matches('#').trim_end_matches('.').to_string()
}

/// Prefix of a value identifier up to its first parameter or local marker:
/// the value's enclosing scope in identifier form, never empty.
pub fn value_scope_prefix(identifier: &str) -> Option<&str> {
    if !identifier.is_char_boundary(1) {
        return None;
    }
    let tail = &identifier[1..];
    let local = tail.find(".local$");
    let param = tail.find(".($");
    let idx = match (local, param) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some(&identifier[..idx + 1])
}

/// Enclosing callable identifier for a parameter or local value, rebuilt
/// with the owning callable's trailing dot.
pub fn value_scope_identifier(identifier: &str) -> Option<String> {
    if let Some(idx) = identifier.rfind(".($") {
        return Some(format!("{}.", &identifier[..idx]));
    }
    if let Some(idx) = identifier.rfind(".local$") {
        return Some(format!("{}.", &identifier[..idx]));
    }
    None
}

// ============================================================================
// Token parsers (winnow) and suffix scanners
// ============================================================================

/// Split `owner.($name)` into the owner prefix and the group name (sigil
/// kept as written). The group must close the descriptor.
fn split_argument_suffix(descriptor: &str) -> Option<(&str, String)> {
    let open = descriptor.rfind(".(")?;
    if open == 0 {
        return None;
    }
    let name = argument_group.parse(&descriptor[open + 1..]).ok()?;
    Some((&descriptor[..open], name))
}

/// Parse a bare identifier token: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn ident(input: &mut &str) -> ModalResult<String> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(str::to_string)
        .parse_next(input)
}

/// Argument group with the sigil kept: `( $?name )`.
fn argument_group(input: &mut &str) -> ModalResult<String> {
    delimited('(', (opt('$'), ident).take().map(str::to_string), ')').parse_next(input)
}

/// Argument group yielding the bare name, sigil dropped.
fn bare_argument_group(input: &mut &str) -> ModalResult<String> {
    delimited('(', preceded(opt('$'), ident), ')').parse_next(input)
}

/// Identifier immediately followed by the local-variable `@` disambiguator.
fn local_tail(input: &mut &str) -> ModalResult<String> {
    terminated(ident, '@').parse_next(input)
}

/// Identifier with at most one trailing dot.
fn property_tail(input: &mut &str) -> ModalResult<String> {
    terminated(ident, opt('.')).parse_next(input)
}

/// Bare name of the first argument group in `identifier`, scanning left to
/// right; the group need not close the identifier.
fn first_argument_name(identifier: &str) -> Option<String> {
    for (idx, _) in identifier.match_indices(".(") {
        let mut rest = &identifier[idx + 1..];
        if let Ok(name) = bare_argument_group(&mut rest) {
            return Some(name);
        }
    }
    None
}

/// Name of the first `.local$name@` marker in `identifier`.
fn local_name(identifier: &str) -> Option<String> {
    for (idx, _) in identifier.match_indices(".local$") {
        let mut rest = &identifier[idx + ".local$".len()..];
        if let Ok(name) = local_tail(&mut rest) {
            return Some(name);
        }
    }
    None
}

/// Name of a `#$name` marker closing `identifier` (one trailing dot
/// tolerated).
fn trailing_property_name(identifier: &str) -> Option<String> {
    let idx = identifier.rfind("#$")?;
    property_tail.parse(&identifier[idx + 2..]).ok()
}

/// Name preceding a `().` suffix (one trailing dot tolerated).
fn trailing_callable_name(callee: &str) -> Option<&str> {
    let s = callee.strip_suffix('.').unwrap_or(callee);
    let s = s.strip_suffix("()")?;
    trailing_ident(s).map(|(_, name)| name)
}

/// Bare name of a trailing `#name` or `#$name` member access (one trailing
/// dot tolerated).
fn trailing_member_name(callee: &str) -> Option<&str> {
    let s = callee.strip_suffix('.').unwrap_or(callee);
    let (start, name) = trailing_ident(s)?;
    let head = &s[..start];
    if head.ends_with("#$") || head.ends_with('#') {
        Some(name)
    } else {
        None
    }
}

/// Final path segment of a `/Type#` suffix.
fn trailing_type_name(return_type: &str) -> Option<&str> {
    let s = return_type.strip_suffix('#')?;
    let (start, name) = trailing_ident(s)?;
    if s[..start].ends_with('/') {
        Some(name)
    } else {
        None
    }
}

/// Longest valid identifier ending at the end of `s`, with its start
/// offset. Leading digits in the trailing alphanumeric run are excluded so
/// the result always starts with a letter or underscore.
fn trailing_ident(s: &str) -> Option<(usize, &str)> {
    let mut run_start = s.len();
    for (idx, ch) in s.char_indices().rev() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            run_start = idx;
        } else {
            break;
        }
    }
    let run = &s[run_start..];
    let offset = run.find(|c: char| c.is_ascii_alphabetic() || c == '_')?;
    let begin = run_start + offset;
    Some((begin, &s[begin..]))
}

// ============================================================================
// Tests
// ============================================================================
