use super::Serializer;

impl Serializer {
    /// Rewrites the `?` placeholders of hand-written SQL into the flavor's
    /// placeholder syntax. Question marks inside quoted strings and quoted
    /// identifiers are left alone.
    ///
    /// ```
    /// use quarry_sql::Serializer;
    ///
    /// let sql = "SELECT * FROM user WHERE name = ? AND note <> '?' AND id > ?";
    /// assert_eq!(
    ///     Serializer::postgresql().rewrite_placeholders(sql),
    ///     "SELECT * FROM user WHERE name = $1 AND note <> '?' AND id > $2"
    /// );
    /// ```
    pub fn rewrite_placeholders(&self, sql: &str) -> String {
        let mut ret = String::with_capacity(sql.len());
        let mut quote = None;
        let mut position = 0;

        for ch in sql.chars() {
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None if matches!(ch, '\'' | '"' | '`') => quote = Some(ch),
                None if ch == '?' => {
                    position += 1;
                    self.placeholder(position, &mut ret);
                    continue;
                }
                None => {}
            }
            ret.push(ch);
        }

        ret
    }

    /// Number of `?` placeholders outside quotes.
    pub fn count_placeholders(&self, sql: &str) -> usize {
        let mut quote = None;
        let mut count = 0;

        for ch in sql.chars() {
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None if matches!(ch, '\'' | '"' | '`') => quote = Some(ch),
                None if ch == '?' => count += 1,
                None => {}
            }
        }

        count
    }
}
