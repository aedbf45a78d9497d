//! Inlines references to generated formula columns.
//!
//! Backends that cannot reference one generated column from another need
//! the referenced formula's own expression spliced in. Expansion is
//! recursive: the spliced expression is itself expanded first. Every
//! substitution is wrapped in a group so the printed result keeps the
//! original precedence.

use indexmap::IndexMap;
use std::collections::HashMap;
use tabula_core::{
    formula::{parse, visit_mut, Expr, VisitMut},
    schema::{Field, FieldId},
    Error, Result,
};

/// Request-scoped expansion state: field metadata, the memo of expanded
/// formulas and the stack of fields currently being expanded.
#[derive(Debug)]
pub struct ExpandContext<'a> {
    fields: &'a IndexMap<FieldId, Field>,
    cache: HashMap<FieldId, Expr>,
    stack: Vec<FieldId>,
}

impl<'a> ExpandContext<'a> {
    pub fn new(fields: &'a IndexMap<FieldId, Field>) -> ExpandContext<'a> {
        ExpandContext {
            fields,
            cache: HashMap::new(),
            stack: vec![],
        }
    }

    /// Expands the expression of `field`, which may not exist yet in the
    /// metadata (a field being defined). A reference that leads back to
    /// `field` is a circular reference.
    pub fn expand_for(&mut self, field: &FieldId, expr: &Expr) -> Result<Expr> {
        self.stack.push(field.clone());
        let ret = self.expand(expr);
        self.stack.pop();
        ret
    }

    /// Expands every generated-formula reference in `expr`.
    pub fn expand(&mut self, expr: &Expr) -> Result<Expr> {
        let mut expanded = expr.clone();
        let mut expander = Expander {
            cx: self,
            error: None,
        };
        expander.visit_expr_mut(&mut expanded);

        match expander.error {
            Some(err) => Err(err),
            None => Ok(expanded),
        }
    }

    /// The fully expanded expression of a stored formula field.
    pub fn expand_field(&mut self, id: &FieldId) -> Result<Expr> {
        if self.stack.contains(id) {
            let root = self.stack.first().unwrap_or(id);
            return Err(Error::circular_reference(root.as_str(), id.as_str()));
        }

        if let Some(expr) = self.cache.get(id) {
            return Ok(expr.clone());
        }

        let field = self
            .fields
            .get(id)
            .ok_or_else(|| Error::unknown_field(id.as_str()))?;
        let options = field.formula_options()?;
        let expr = parse(&options.expression)
            .map_err(|err| err.context(format!("parsing formula of field {id}")))?;

        self.stack.push(id.clone());
        let ret = self.expand(&expr);
        self.stack.pop();

        let expanded = ret?;
        tracing::trace!(field = %id, expanded = %expanded, "expanded generated formula");
        self.cache.insert(id.clone(), expanded.clone());
        Ok(expanded)
    }

    fn should_expand(&self, id: &FieldId) -> Result<bool> {
        let field = self
            .fields
            .get(id)
            .ok_or_else(|| Error::unknown_field(id.as_str()))?;
        Ok(field.is_generated_formula())
    }
}

/// Parses, expands and prints `expression` on behalf of `field`.
pub fn expand(field: &FieldId, expression: &str, cx: &mut ExpandContext<'_>) -> Result<String> {
    let expr = parse(expression)?;
    Ok(cx.expand_for(field, &expr)?.to_string())
}

struct Expander<'c, 'a> {
    cx: &'c mut ExpandContext<'a>,
    error: Option<Error>,
}

impl VisitMut for Expander<'_, '_> {
    fn visit_expr_mut(&mut self, node: &mut Expr) {
        if self.error.is_some() {
            return;
        }

        let Expr::Field(field) = &*node else {
            visit_mut::visit_expr_mut(self, node);
            return;
        };

        let id = field.id.clone();
        let substituted = self.cx.should_expand(&id).and_then(|expand| {
            if expand {
                self.cx.expand_field(&id).map(Some)
            } else {
                Ok(None)
            }
        });

        match substituted {
            Ok(Some(expr)) => *node = Expr::group(expr),
            Ok(None) => {}
            Err(err) => self.error = Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::{
        schema::{FieldKind, TableId},
        Type,
    };

    fn stored(id: &str) -> Field {
        Field {
            id: FieldId::new(id),
            table: TableId::new("tblA"),
            name: id.to_string(),
            kind: FieldKind::Stored,
            ty: Type::Number,
            db_column: id.to_string(),
            is_computed: false,
            db_generated: false,
            options: None,
        }
    }

    fn formula(id: &str, expression: &str, db_generated: bool) -> Field {
        Field {
            kind: FieldKind::Formula,
            is_computed: true,
            db_generated,
            options: Some(
                serde_json::json!({ "expression": expression, "dbGenerated": db_generated })
                    .to_string(),
            ),
            ..stored(id)
        }
    }

    fn fields(list: Vec<Field>) -> IndexMap<FieldId, Field> {
        list.into_iter().map(|f| (f.id.clone(), f)).collect()
    }

    #[test]
    fn three_level_chain() {
        let fields = fields(vec![
            stored("field1"),
            formula("field2", "{field1} + 10", true),
        ]);
        let mut cx = ExpandContext::new(&fields);
        let expanded = expand(&FieldId::new("field3"), "{field2} * 2", &mut cx).unwrap();
        assert_eq!(expanded, "({field1} + 10) * 2");
    }

    #[test]
    fn four_level_chain() {
        let fields = fields(vec![
            stored("field1"),
            formula("field2", "{field1} + 10", true),
            formula("field3", "{field2} * 2", true),
        ]);
        let mut cx = ExpandContext::new(&fields);
        let expanded = expand(&FieldId::new("field4"), "{field3} + 5", &mut cx).unwrap();
        assert_eq!(expanded, "(({field1} + 10) * 2) + 5");
    }

    #[test]
    fn plain_formula_references_are_kept() {
        let fields = fields(vec![
            stored("field1"),
            formula("field2", "{field1} + 10", false),
        ]);
        let mut cx = ExpandContext::new(&fields);
        let expanded = expand(&FieldId::new("field3"), "{field2} * 2", &mut cx).unwrap();
        assert_eq!(expanded, "{field2} * 2");
    }

    #[test]
    fn memoized_across_references() {
        let fields = fields(vec![
            stored("field1"),
            formula("field2", "{field1} + 10", true),
        ]);
        let mut cx = ExpandContext::new(&fields);
        let expanded = expand(&FieldId::new("field3"), "{field2} + {field2}", &mut cx).unwrap();
        assert_eq!(expanded, "({field1} + 10) + ({field1} + 10)");
        assert_eq!(cx.cache.len(), 1);
    }

    #[test]
    fn cycles_are_errors() {
        // field2 already refers to field3, which is being (re)defined.
        let fields = fields(vec![
            stored("field1"),
            formula("field2", "{field3} + 1", true),
            formula("field3", "{field1}", true),
        ]);
        let mut cx = ExpandContext::new(&fields);
        let err = expand(&FieldId::new("field3"), "{field2} * 2", &mut cx).unwrap_err();
        assert!(err.is_circular_reference());
        assert!(err.to_string().contains("field3"));
    }

    #[test]
    fn self_reference() {
        let fields = fields(vec![formula("field1", "{field1} + 1", true)]);
        let mut cx = ExpandContext::new(&fields);
        let err = cx.expand_field(&FieldId::new("field1")).unwrap_err();
        assert!(err.is_circular_reference());
    }

    #[test]
    fn unknown_and_malformed() {
        let mut broken = formula("field2", "", true);
        broken.options = Some("{not json".to_string());
        let fields = fields(vec![broken]);

        let mut cx = ExpandContext::new(&fields);
        let err = expand(&FieldId::new("x"), "{nope}", &mut cx).unwrap_err();
        assert!(err.is_unknown_field());

        let err = expand(&FieldId::new("x"), "{field2}", &mut cx).unwrap_err();
        assert!(err.is_invalid_options());
    }
}
