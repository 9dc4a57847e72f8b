//! Quoted-CSV tokenizer.
//!
//! A three-state machine over characters. [`step`] is the whole transition
//! table; [`tokenize`] just drives it and collects fields into records.

/// Tokenizer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    /// Outside quotes.
    Field,
    /// Inside a quoted section; commas and newlines are literal.
    QuotedField,
    /// Just saw a quote inside a quoted section. A second quote is an escaped `"`.
    QuoteClosed,
}

/// What to do with the character just consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Append this character to the current field.
    Append(char),
    /// Consume the character without output (quote delimiters).
    Skip,
    /// Finish the current field.
    EndField,
    /// Finish the current field and the current record.
    EndRecord,
}

/// One transition of the tokenizer.
pub fn step(state: TokenState, c: char) -> (TokenState, Action) {
    use TokenState::*;

    match (state, c) {
        (Field, '"') => (QuotedField, Action::Skip),
        (Field, ',') => (Field, Action::EndField),
        (Field, '\n') => (Field, Action::EndRecord),
        (Field, c) => (Field, Action::Append(c)),

        (QuotedField, '"') => (QuoteClosed, Action::Skip),
        (QuotedField, c) => (QuotedField, Action::Append(c)),

        (QuoteClosed, '"') => (QuotedField, Action::Append('"')),
        (QuoteClosed, ',') => (Field, Action::EndField),
        (QuoteClosed, '\n') => (Field, Action::EndRecord),
        (QuoteClosed, c) => (Field, Action::Append(c)),
    }
}

/// Splits `input` into records of trimmed fields.
///
/// A trailing record without a final newline is still emitted. An unterminated
/// quote swallows the rest of the input into its field.
pub fn tokenize(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = TokenState::Field;
    let mut dirty = false;

    for c in input.chars() {
        let (next, action) = step(state, c);
        state = next;
        match action {
            Action::Append(c) => {
                field.push(c);
                dirty = true;
            }
            Action::Skip => dirty = true,
            Action::EndField => {
                record.push(field.trim().to_string());
                field.clear();
                dirty = true;
            }
            Action::EndRecord => {
                record.push(field.trim().to_string());
                field.clear();
                records.push(std::mem::take(&mut record));
                dirty = false;
            }
        }
    }

    if dirty {
        record.push(field.trim().to_string());
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenState::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(step(Field, '"'), (QuotedField, Action::Skip));
        assert_eq!(step(Field, ','), (Field, Action::EndField));
        assert_eq!(step(Field, '\n'), (Field, Action::EndRecord));
        assert_eq!(step(Field, 'a'), (Field, Action::Append('a')));

        assert_eq!(step(QuotedField, ','), (QuotedField, Action::Append(',')));
        assert_eq!(step(QuotedField, '\n'), (QuotedField, Action::Append('\n')));
        assert_eq!(step(QuotedField, '"'), (QuoteClosed, Action::Skip));

        assert_eq!(step(QuoteClosed, '"'), (QuotedField, Action::Append('"')));
        assert_eq!(step(QuoteClosed, ','), (Field, Action::EndField));
        assert_eq!(step(QuoteClosed, '\n'), (Field, Action::EndRecord));
        assert_eq!(step(QuoteClosed, 'x'), (Field, Action::Append('x')));
    }

    #[test]
    fn test_simple_records() {
        let records = tokenize("a,b\nc,d\n");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_quoted_comma_and_newline() {
        let records = tokenize("\"Cafe, X\",\"line one\nline two\"\n");
        assert_eq!(records, vec![vec!["Cafe, X", "line one\nline two"]]);
    }

    #[test]
    fn test_escaped_quote() {
        let records = tokenize("\"say \"\"hi\"\"\",x");
        assert_eq!(records, vec![vec!["say \"hi\"", "x"]]);
    }

    #[test]
    fn test_trailing_record_without_newline() {
        let records = tokenize("a,b\nc,");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", ""]]);
    }

    #[test]
    fn test_crlf_is_trimmed() {
        let records = tokenize("a,b\r\nc,d\r\n");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_blank_line_is_single_empty_field() {
        let records = tokenize("a\n\nb\n");
        assert_eq!(records, vec![vec!["a"], vec![""], vec!["b"]]);
    }
}
