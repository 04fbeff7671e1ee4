//! Built-in exercise catalog.
//!
//! The catalog is fixed and ordered; ids start at 1 and are contiguous, which the daily
//! challenge generator relies on.

use crate::domain::ExerciseId;
use crate::validator::{self, Requirement};

#[derive(Debug)]
pub struct Exercise {
  pub id: ExerciseId,
  pub title: &'static str,
  pub description: &'static str,
  pub initial_code: &'static str,
  pub solution: &'static str,
  pub hints: &'static [&'static str],
  pub rules: &'static [Requirement],
}

impl Exercise {
  pub fn validate(&self, code: &str) -> bool {
    validator::validate(code, self.rules)
  }

  /// First unmet requirement as a learner-facing message.
  pub fn explain(&self, code: &str) -> Result<(), String> {
    validator::explain(code, self.rules)
  }
}

pub static EXERCISES: &[Exercise] = &[
  Exercise {
    id: 1,
    title: "Build a simple table",
    description: "Create a simple table with one header row and two data rows. Use the <table>, <tr>, <th> and <td> tags.",
    initial_code: "<!-- Build your table here -->",
    solution: r#"<table border="1">
  <tr>
    <th>Name</th>
    <th>Age</th>
  </tr>
  <tr>
    <td>Anna</td>
    <td>25</td>
  </tr>
  <tr>
    <td>Max</td>
    <td>30</td>
  </tr>
</table>"#,
    hints: &[
      "Use the <table> tag for the table",
      "The header row is built from <th> tags",
      "Data cells use <td> tags",
      "Every row needs a <tr> tag",
    ],
    rules: &[
      Requirement::TableFrame,
      Requirement::Element("th"),
      Requirement::Element("td"),
      Requirement::Element("tr"),
    ],
  },
  Exercise {
    id: 2,
    title: "Table with colspan",
    description: "Create a table with a cell that spans two columns. Use the colspan attribute.",
    initial_code: r#"<table border="1">
  <tr>
    <th>Name</th>
    <th>Age</th>
    <th>City</th>
  </tr>
  <!-- Add a row with colspan here -->
</table>"#,
    solution: r#"<table border="1">
  <tr>
    <th>Name</th>
    <th>Age</th>
    <th>City</th>
  </tr>
  <tr>
    <td colspan="2">Total</td>
    <td>2</td>
  </tr>
</table>"#,
    hints: &[
      "Add a new <tr> row",
      "Put the colspan attribute on a <td> tag",
      "colspan=\"2\" makes the cell two columns wide",
    ],
    rules: &[
      Requirement::Element("tr"),
      Requirement::Attribute { tag: "td", attr: "colspan" },
    ],
  },
  Exercise {
    id: 3,
    title: "Table with rowspan",
    description: "Create a table with a cell that spans two rows. Use the rowspan attribute.",
    initial_code: r#"<table border="1">
  <tr>
    <th>Category</th>
    <th>Product</th>
    <th>Price</th>
  </tr>
  <!-- Add rows with rowspan here -->"#,
    solution: r#"<table border="1">
  <tr>
    <th>Category</th>
    <th>Product</th>
    <th>Price</th>
  </tr>
  <tr>
    <td rowspan="2">Fruit</td>
    <td>Apple</td>
    <td>1.50€</td>
  </tr>
  <tr>
    <td>Banana</td>
    <td>1.20€</td>
  </tr>
</table>"#,
    hints: &[
      "Put the rowspan attribute on a <td> tag",
      "rowspan=\"2\" makes the cell two rows tall",
      "The following row then needs one cell less",
    ],
    rules: &[
      Requirement::Element("tr"),
      Requirement::Attribute { tag: "td", attr: "rowspan" },
    ],
  },
  Exercise {
    id: 4,
    title: "Complex table",
    description: "Create a complex table that uses both colspan and rowspan on data cells.",
    initial_code: "<!-- Build a complex table here -->",
    solution: r#"<table border="1">
  <tr>
    <th colspan="2">Staff</th>
    <th>Age</th>
  </tr>
  <tr>
    <td rowspan="2">Engineering</td>
    <td>Anna</td>
    <td>25</td>
  </tr>
  <tr>
    <td>Max</td>
    <td>30</td>
  </tr>
  <tr>
    <td rowspan="2">Design</td>
    <td>Lisa</td>
    <td>28</td>
  </tr>
  <tr>
    <td>Tom</td>
    <td>32</td>
  </tr>
  <tr>
    <td colspan="2">Headcount</td>
    <td>4</td>
  </tr>
</table>"#,
    hints: &[
      "Sketch the table layout on paper first",
      "Use colspan for cells spanning several columns",
      "Use rowspan for cells spanning several rows",
      "Check that every row ends up with the right number of cells",
    ],
    rules: &[
      Requirement::Element("tr"),
      Requirement::Element("th"),
      Requirement::Element("td"),
      Requirement::Attribute { tag: "td", attr: "rowspan" },
      Requirement::Attribute { tag: "td", attr: "colspan" },
    ],
  },
];

pub fn exercise(id: ExerciseId) -> Option<&'static Exercise> {
  EXERCISES.iter().find(|e| e.id == id)
}

pub fn catalog_size() -> usize {
  EXERCISES.len()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn solutions_pass_and_initial_code_does_not() {
    for ex in EXERCISES {
      assert!(ex.validate(ex.solution), "solution of exercise {} must validate", ex.id);
      assert!(!ex.validate(ex.initial_code), "initial code of exercise {} must not validate", ex.id);
    }
  }

  #[test]
  fn ids_are_contiguous_from_one() {
    for (i, ex) in EXERCISES.iter().enumerate() {
      assert_eq!(ex.id as usize, i + 1);
      assert!(!ex.hints.is_empty());
    }
    assert!(exercise(0).is_none());
    assert!(exercise(catalog_size() as ExerciseId).is_some());
  }

  #[test]
  fn no_table_fails_every_exercise() {
    let fragment = r#"<div colspan="2"><th>h</th><td rowspan="2" colspan="2">x</td></div>"#;
    for ex in EXERCISES {
      assert!(!ex.validate(fragment));
    }
  }

  #[test]
  fn complex_exercise_reports_missing_colspan() {
    let ex = exercise(4).unwrap();
    let html = r#"<table><tr><th>h</th></tr><tr><td rowspan="2">a</td></tr></table>"#;
    assert_eq!(ex.explain(html), Err("No <td> with a colspan attribute yet.".to_string()));
  }
}
