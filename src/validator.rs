//! Structural checks over an HTML fragment.
//!
//! Predicates only test for the presence of elements and attributes; attribute values
//! are never range-checked (`colspan="99"` passes like `colspan="2"`). Any markup is
//! accepted by the parser, so a broken fragment simply fails the checks.

use scraper::{Html, Selector};

/// One structural predicate. Every rule set implicitly requires a `<table>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
  /// At least one element with this tag name.
  Element(&'static str),
  /// At least one `tag` element carrying `attr`.
  Attribute { tag: &'static str, attr: &'static str },
  /// The first `<table>` has a `border` attribute or an inline `style`.
  TableFrame,
}

impl Requirement {
  pub fn holds(&self, doc: &Html) -> bool {
    match self {
      Requirement::Element(tag) => exists(doc, tag),
      Requirement::Attribute { tag, attr } => exists(doc, &format!("{tag}[{attr}]")),
      Requirement::TableFrame => first_table_has_frame(doc),
    }
  }

  /// Learner-facing message for when this requirement is not met.
  pub fn unmet_message(&self) -> String {
    match self {
      Requirement::Element(tag) => format!("No <{tag}> element yet."),
      Requirement::Attribute { tag, attr } => format!("No <{tag}> with a {attr} attribute yet."),
      Requirement::TableFrame => "The table needs a border attribute or an inline style.".into(),
    }
  }
}

pub const NO_TABLE: &str = "No table element found. Add a <table> element.";
pub const NO_CELLS: &str = "The table needs header (th) or body (td) cells.";

fn selector(css: &str) -> Option<Selector> {
  Selector::parse(css).ok()
}

fn exists(doc: &Html, css: &str) -> bool {
  selector(css).map(|s| doc.select(&s).next().is_some()).unwrap_or(false)
}

fn first_table_has_frame(doc: &Html) -> bool {
  let Some(sel) = selector("table") else { return false };
  doc
    .select(&sel)
    .next()
    .map(|t| t.value().attr("border").is_some() || t.value().attr("style").is_some())
    .unwrap_or(false)
}

pub fn parse(fragment: &str) -> Html {
  Html::parse_fragment(fragment)
}

/// First unmet requirement, or Ok if the fragment satisfies the whole rule set.
pub fn explain(fragment: &str, rules: &[Requirement]) -> Result<(), String> {
  let doc = parse(fragment);
  if !exists(&doc, "table") {
    return Err(NO_TABLE.into());
  }
  match rules.iter().find(|r| !r.holds(&doc)) {
    Some(r) => Err(r.unmet_message()),
    None => Ok(()),
  }
}

pub fn validate(fragment: &str, rules: &[Requirement]) -> bool {
  explain(fragment, rules).is_ok()
}

/// Editor-level structure check, independent of any exercise: an empty fragment is fine,
/// otherwise there must be a table and every table needs header or body cells.
pub fn editor_diagnostic(fragment: &str) -> Option<String> {
  if fragment.trim().is_empty() {
    return None;
  }
  let doc = parse(fragment);
  let Some(tables) = selector("table") else { return None };
  let mut saw_table = false;
  for table in doc.select(&tables) {
    saw_table = true;
    let has = |css: &str| selector(css).map(|s| table.select(&s).next().is_some()).unwrap_or(false);
    let has_header = has("th") || has("thead");
    let has_body = has("td") || has("tbody");
    if !has_header && !has_body {
      return Some(NO_CELLS.into());
    }
  }
  if !saw_table {
    return Some(NO_TABLE.into());
  }
  None
}
