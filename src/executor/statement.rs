use std::borrow::Cow;

/// Query text handed to an engine operation: verbatim SQL or a stored-procedure name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryText<'a> {
    Raw(Cow<'a, str>),
    Procedure(Cow<'a, str>),
}

impl<'a> QueryText<'a> {
    #[must_use]
    pub fn raw(sql: impl Into<Cow<'a, str>>) -> Self {
        QueryText::Raw(sql.into())
    }

    #[must_use]
    pub fn procedure(name: impl Into<Cow<'a, str>>) -> Self {
        QueryText::Procedure(name.into())
    }

    /// Final SQL for `argc` positional arguments.
    #[must_use]
    pub fn render(&self, argc: usize) -> Cow<'_, str> {
        match self {
            QueryText::Raw(sql) => Cow::Borrowed(sql.as_ref()),
            QueryText::Procedure(name) => Cow::Owned(call_statement(name, argc)),
        }
    }
}

impl<'a> From<&'a str> for QueryText<'a> {
    fn from(sql: &'a str) -> Self {
        QueryText::Raw(Cow::Borrowed(sql))
    }
}

impl From<String> for QueryText<'static> {
    fn from(sql: String) -> Self {
        QueryText::Raw(Cow::Owned(sql))
    }
}

impl<'a> From<&'a String> for QueryText<'a> {
    fn from(sql: &'a String) -> Self {
        QueryText::Raw(Cow::Borrowed(sql.as_str()))
    }
}

/// ``CALL `name`(?,?,...)`` with one placeholder per argument.
///
/// ```rust
/// use sql_mapper::executor::call_statement;
///
/// assert_eq!(call_statement("get_users", 2), "CALL `get_users`(?,?)");
/// assert_eq!(call_statement("ping", 0), "CALL `ping`()");
/// ```
#[must_use]
pub fn call_statement(name: &str, argc: usize) -> String {
    let placeholders = vec!["?"; argc].join(",");
    format!("CALL `{name}`({placeholders})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_text_is_passed_through() {
        let q = QueryText::from("SELECT * FROM t WHERE a = ?");
        assert_eq!(q.render(1), "SELECT * FROM t WHERE a = ?");
    }

    #[test]
    fn procedure_gets_one_placeholder_per_argument() {
        let q = QueryText::procedure("sp_orders");
        assert_eq!(q.render(3), "CALL `sp_orders`(?,?,?)");
        assert_eq!(q.render(1), "CALL `sp_orders`(?)");
        assert_eq!(q.render(0), "CALL `sp_orders`()");
    }
}
