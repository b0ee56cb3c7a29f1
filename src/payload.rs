//! Fixed-path navigation through the InnerTube search payload.
//!
//! The payload schema is undocumented and owned by YouTube. Every structural
//! assumption this crate makes about it goes through [`lookup`], so a schema
//! change surfaces as one [`ShapeError`] naming the path that no longer exists.

use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;

/// One step of a path into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// Object member.
  Key(&'static str),
  /// Array element by position.
  Index(usize),
  /// Final array element.
  Last,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected search payload shape at `{path}`: expected {expected}")]
pub struct ShapeError {
  /// Dotted rendering of the path up to and including the failing step.
  pub path: String,
  pub expected: &'static str,
}

fn push_step(path: &mut String, step: Step) {
  match step {
    Step::Key(key) => {
      if !path.is_empty() {
        path.push('.');
      }
      path.push_str(key);
    }
    Step::Index(i) => {
      let _ = write!(path, "[{}]", i);
    }
    Step::Last => path.push_str("[-1]"),
  }
}

/// Render a path the same way errors report it.
pub fn render_path(steps: &[Step]) -> String {
  let mut path = String::new();
  for step in steps {
    push_step(&mut path, *step);
  }
  path
}

/// Walk `steps` from `root`.
pub fn lookup<'a>(root: &'a Value, steps: &[Step]) -> Result<&'a Value, ShapeError> {
  let mut current = root;
  let mut path = String::new();
  for step in steps {
    push_step(&mut path, *step);
    current = match *step {
      Step::Key(key) => current.get(key).ok_or_else(|| ShapeError { path: path.clone(), expected: "an object member" })?,
      Step::Index(i) => current.get(i).ok_or_else(|| ShapeError { path: path.clone(), expected: "an array element" })?,
      Step::Last => current
        .as_array()
        .and_then(|items| items.last())
        .ok_or_else(|| ShapeError { path: path.clone(), expected: "a non-empty array" })?,
    };
  }
  Ok(current)
}

/// [`lookup`] that additionally requires a string at the end of the path.
pub fn lookup_str<'a>(root: &'a Value, steps: &[Step]) -> Result<&'a str, ShapeError> {
  lookup(root, steps)?.as_str().ok_or_else(|| ShapeError { path: render_path(steps), expected: "a string" })
}

/// [`lookup`] that additionally requires an array at the end of the path.
pub fn lookup_array<'a>(root: &'a Value, steps: &[Step]) -> Result<&'a [Value], ShapeError> {
  lookup(root, steps)?.as_array().map(Vec::as_slice).ok_or_else(|| ShapeError { path: render_path(steps), expected: "an array" })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const PATH: &[Step] = &[Step::Key("a"), Step::Key("list"), Step::Index(1), Step::Key("name")];

  #[test]
  fn lookup_follows_keys_and_indices() {
    let v = json!({"a": {"list": [{"name": "zero"}, {"name": "one"}]}});
    assert_eq!(lookup_str(&v, PATH).unwrap(), "one");
  }

  #[test]
  fn lookup_last_takes_final_element() {
    let v = json!({"xs": [{"u": "low"}, {"u": "mid"}, {"u": "high"}]});
    let steps = [Step::Key("xs"), Step::Last, Step::Key("u")];
    assert_eq!(lookup_str(&v, &steps).unwrap(), "high");
  }

  #[test]
  fn missing_key_reports_path_so_far() {
    let v = json!({"a": {"other": []}});
    let err = lookup(&v, PATH).unwrap_err();
    assert_eq!(err.path, "a.list");
    assert_eq!(err.expected, "an object member");
  }

  #[test]
  fn index_out_of_range_is_shape_error() {
    let v = json!({"a": {"list": [{"name": "zero"}]}});
    let err = lookup(&v, PATH).unwrap_err();
    assert_eq!(err.path, "a.list[1]");
  }

  #[test]
  fn last_on_empty_array_is_shape_error() {
    let v = json!({"xs": []});
    let err = lookup(&v, &[Step::Key("xs"), Step::Last]).unwrap_err();
    assert_eq!(err.path, "xs[-1]");
    assert_eq!(err.expected, "a non-empty array");
  }

  #[test]
  fn wrong_leaf_type_is_shape_error() {
    let v = json!({"a": {"list": [{}, {"name": 7}]}});
    let err = lookup_str(&v, PATH).unwrap_err();
    assert_eq!(err.expected, "a string");
    assert_eq!(err.to_string(), "unexpected search payload shape at `a.list[1].name`: expected a string");
  }

  #[test]
  fn lookup_array_rejects_objects() {
    let v = json!({"a": {}});
    assert!(lookup_array(&v, &[Step::Key("a")]).is_err());
    let v = json!({"a": [1, 2]});
    assert_eq!(lookup_array(&v, &[Step::Key("a")]).unwrap().len(), 2);
  }
}
