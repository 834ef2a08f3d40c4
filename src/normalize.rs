use crate::Cell;
use regex::Regex;
use std::sync::OnceLock;

// Business convention: supplier exports embed bracketed codes inside the
// item name as *CODE*. Both sides of a reconciliation must agree on the
// bare name, so every star-delimited run is removed, non-greedily.
fn star_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*.*?\*").expect("valid star pattern"))
}

/// Normalize an item name for key matching: strip every `*…*` annotation
/// (asterisks included) and trim surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    star_pattern().replace_all(text, "").trim().to_string()
}

/// Cell-level normalization. A missing value yields an empty string; any
/// other scalar is rendered to text first.
pub fn clean_name(cell: &Cell) -> String {
    if cell.is_empty() {
        return String::new();
    }
    clean_text(&cell.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_star_delimited_annotation() {
        assert_eq!(clean_text("ABC*CODE123*DEF"), "ABCDEF");
        assert_eq!(clean_text("爱他美*进口*奶粉"), "爱他美奶粉");
    }

    #[test]
    fn test_non_greedy_across_multiple_annotations() {
        // Two separate pairs, not one greedy span.
        assert_eq!(clean_text("a*x*b*y*c"), "abc");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(clean_text("  名称  "), "名称");
        assert_eq!(clean_text(" *code* name "), "name");
    }

    #[test]
    fn test_unpaired_star_is_kept() {
        assert_eq!(clean_text("a*b"), "a*b");
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["ABC*CODE123*DEF", "  plain  ", "a*x*b*y*c", ""];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_missing_cell_yields_empty_string() {
        assert_eq!(clean_name(&Cell::Empty), "");
        assert_eq!(clean_name(&Cell::Text("*a*".to_string())), "");
        assert_eq!(clean_name(&Cell::Number(12.0)), "12");
    }
}
