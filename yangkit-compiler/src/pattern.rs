//! XML-Schema regular expression adapter
//!
//! YANG patterns use the W3C XML-Schema regex dialect: `$` and `^` are
//! literals, the whole expression is implicitly anchored, and Unicode
//! blocks are addressed as `\p{IsBlock}`. The adapter rewrites such a
//! pattern into a form the `regex` backend accepts: literals escaped,
//! an anchoring group appended unless the pattern ends in `.*`, and
//! block escapes expanded to explicit codepoint classes. Compilation
//! prepends `\A`, pinning the match to the start the way an anchored
//! PCRE would; `$` in the backend already matches only at the end, and
//! groups are never captured by index.

use std::sync::Arc;
use yangkit_core::error::{Result, YangError};
use yangkit_core::schema::compiled::CompiledPattern;
use yangkit_core::schema::parsed::{Restriction, PATTERN_INVERT_MARK, PATTERN_MATCH_MARK};

/// XML-Schema Unicode block names with their codepoint ranges
/// (http://www.w3.org/TR/2004/REC-xmlschema-2-20041028/#regexs)
static UNICODE_BLOCKS: &[(&str, &str)] = &[
    ("BasicLatin", "[\\x{0000}-\\x{007F}]"),
    ("Latin-1Supplement", "[\\x{0080}-\\x{00FF}]"),
    ("LatinExtended-A", "[\\x{0100}-\\x{017F}]"),
    ("LatinExtended-B", "[\\x{0180}-\\x{024F}]"),
    ("IPAExtensions", "[\\x{0250}-\\x{02AF}]"),
    ("SpacingModifierLetters", "[\\x{02B0}-\\x{02FF}]"),
    ("CombiningDiacriticalMarks", "[\\x{0300}-\\x{036F}]"),
    ("Greek", "[\\x{0370}-\\x{03FF}]"),
    ("Cyrillic", "[\\x{0400}-\\x{04FF}]"),
    ("Armenian", "[\\x{0530}-\\x{058F}]"),
    ("Hebrew", "[\\x{0590}-\\x{05FF}]"),
    ("Arabic", "[\\x{0600}-\\x{06FF}]"),
    ("Syriac", "[\\x{0700}-\\x{074F}]"),
    ("Thaana", "[\\x{0780}-\\x{07BF}]"),
    ("Devanagari", "[\\x{0900}-\\x{097F}]"),
    ("Bengali", "[\\x{0980}-\\x{09FF}]"),
    ("Gurmukhi", "[\\x{0A00}-\\x{0A7F}]"),
    ("Gujarati", "[\\x{0A80}-\\x{0AFF}]"),
    ("Oriya", "[\\x{0B00}-\\x{0B7F}]"),
    ("Tamil", "[\\x{0B80}-\\x{0BFF}]"),
    ("Telugu", "[\\x{0C00}-\\x{0C7F}]"),
    ("Kannada", "[\\x{0C80}-\\x{0CFF}]"),
    ("Malayalam", "[\\x{0D00}-\\x{0D7F}]"),
    ("Sinhala", "[\\x{0D80}-\\x{0DFF}]"),
    ("Thai", "[\\x{0E00}-\\x{0E7F}]"),
    ("Lao", "[\\x{0E80}-\\x{0EFF}]"),
    ("Tibetan", "[\\x{0F00}-\\x{0FFF}]"),
    ("Myanmar", "[\\x{1000}-\\x{109F}]"),
    ("Georgian", "[\\x{10A0}-\\x{10FF}]"),
    ("HangulJamo", "[\\x{1100}-\\x{11FF}]"),
    ("Ethiopic", "[\\x{1200}-\\x{137F}]"),
    ("Cherokee", "[\\x{13A0}-\\x{13FF}]"),
    ("UnifiedCanadianAboriginalSyllabics", "[\\x{1400}-\\x{167F}]"),
    ("Ogham", "[\\x{1680}-\\x{169F}]"),
    ("Runic", "[\\x{16A0}-\\x{16FF}]"),
    ("Khmer", "[\\x{1780}-\\x{17FF}]"),
    ("Mongolian", "[\\x{1800}-\\x{18AF}]"),
    ("LatinExtendedAdditional", "[\\x{1E00}-\\x{1EFF}]"),
    ("GreekExtended", "[\\x{1F00}-\\x{1FFF}]"),
    ("GeneralPunctuation", "[\\x{2000}-\\x{206F}]"),
    ("SuperscriptsandSubscripts", "[\\x{2070}-\\x{209F}]"),
    ("CurrencySymbols", "[\\x{20A0}-\\x{20CF}]"),
    ("CombiningMarksforSymbols", "[\\x{20D0}-\\x{20FF}]"),
    ("LetterlikeSymbols", "[\\x{2100}-\\x{214F}]"),
    ("NumberForms", "[\\x{2150}-\\x{218F}]"),
    ("Arrows", "[\\x{2190}-\\x{21FF}]"),
    ("MathematicalOperators", "[\\x{2200}-\\x{22FF}]"),
    ("MiscellaneousTechnical", "[\\x{2300}-\\x{23FF}]"),
    ("ControlPictures", "[\\x{2400}-\\x{243F}]"),
    ("OpticalCharacterRecognition", "[\\x{2440}-\\x{245F}]"),
    ("EnclosedAlphanumerics", "[\\x{2460}-\\x{24FF}]"),
    ("BoxDrawing", "[\\x{2500}-\\x{257F}]"),
    ("BlockElements", "[\\x{2580}-\\x{259F}]"),
    ("GeometricShapes", "[\\x{25A0}-\\x{25FF}]"),
    ("MiscellaneousSymbols", "[\\x{2600}-\\x{26FF}]"),
    ("Dingbats", "[\\x{2700}-\\x{27BF}]"),
    ("BraillePatterns", "[\\x{2800}-\\x{28FF}]"),
    ("CJKRadicalsSupplement", "[\\x{2E80}-\\x{2EFF}]"),
    ("KangxiRadicals", "[\\x{2F00}-\\x{2FDF}]"),
    ("IdeographicDescriptionCharacters", "[\\x{2FF0}-\\x{2FFF}]"),
    ("CJKSymbolsandPunctuation", "[\\x{3000}-\\x{303F}]"),
    ("Hiragana", "[\\x{3040}-\\x{309F}]"),
    ("Katakana", "[\\x{30A0}-\\x{30FF}]"),
    ("Bopomofo", "[\\x{3100}-\\x{312F}]"),
    ("HangulCompatibilityJamo", "[\\x{3130}-\\x{318F}]"),
    ("Kanbun", "[\\x{3190}-\\x{319F}]"),
    ("BopomofoExtended", "[\\x{31A0}-\\x{31BF}]"),
    ("EnclosedCJKLettersandMonths", "[\\x{3200}-\\x{32FF}]"),
    ("CJKCompatibility", "[\\x{3300}-\\x{33FF}]"),
    ("CJKUnifiedIdeographsExtensionA", "[\\x{3400}-\\x{4DB5}]"),
    ("CJKUnifiedIdeographs", "[\\x{4E00}-\\x{9FFF}]"),
    ("YiSyllables", "[\\x{A000}-\\x{A48F}]"),
    ("YiRadicals", "[\\x{A490}-\\x{A4CF}]"),
    ("HangulSyllables", "[\\x{AC00}-\\x{D7A3}]"),
    ("PrivateUse", "[\\x{E000}-\\x{F8FF}]"),
    ("CJKCompatibilityIdeographs", "[\\x{F900}-\\x{FAFF}]"),
    ("AlphabeticPresentationForms", "[\\x{FB00}-\\x{FB4F}]"),
    ("ArabicPresentationForms-A", "[\\x{FB50}-\\x{FDFF}]"),
    ("CombiningHalfMarks", "[\\x{FE20}-\\x{FE2F}]"),
    ("CJKCompatibilityForms", "[\\x{FE30}-\\x{FE4F}]"),
    ("SmallFormVariants", "[\\x{FE50}-\\x{FE6F}]"),
    ("ArabicPresentationForms-B", "[\\x{FE70}-\\x{FEFE}]"),
    ("HalfwidthandFullwidthForms", "[\\x{FF00}-\\x{FFEF}]"),
];

/// Rewrite an XML-Schema pattern into its anchored backend form
///
/// Escapes raw `$` and `^`, wraps the expression in `(`..`)$` unless
/// it ends with `.*`, and expands `\p{IsBlock}` escapes against the
/// block table.
///
/// # Errors
///
/// Returns a pattern error for an unterminated character property or
/// an unknown block name.
pub fn xsd_regex_to_anchored(pattern: &str) -> Result<String> {
    let anchor = !pattern.ends_with(".*");

    let mut out = String::with_capacity(pattern.len() + 4);
    if anchor {
        out.push('(');
    }
    for c in pattern.chars() {
        match c {
            '$' => out.push_str("\\$"),
            '^' => out.push_str("\\^"),
            _ => out.push(c),
        }
    }
    if anchor {
        out.push_str(")$");
    }

    // substitute Unicode character blocks with explicit ranges
    while let Some(start) = out.find("\\p{Is") {
        let Some(close) = out[start..].find('}') else {
            return Err(YangError::Pattern {
                message: "unterminated character property".to_string(),
                pattern: Some(pattern.to_string()),
            });
        };
        let end = start + close + 1;

        let block = &out[start + 5..];
        let Some((_, range)) = UNICODE_BLOCKS
            .iter()
            .find(|(name, _)| block.starts_with(name))
        else {
            return Err(YangError::Pattern {
                message: format!("unknown block name \"{}\"", &out[start + 5..end - 1]),
                pattern: Some(pattern.to_string()),
            });
        };

        // inside an unescaped character class the replacement loses
        // its own brackets
        let mut depth = 0i32;
        let bytes = out.as_bytes();
        for idx in 0..start {
            let escaped = idx > 0 && bytes[idx - 1] == b'\\';
            match bytes[idx] {
                b'[' if !escaped => depth += 1,
                b']' if !escaped => depth -= 1,
                _ => {}
            }
        }
        let replacement = if depth > 0 {
            &range[1..range.len() - 1]
        } else {
            range
        };
        out.replace_range(start..end, replacement);
    }

    Ok(out)
}

/// Compile one parsed `pattern` restriction into a shared pattern
///
/// The argument may start with [`PATTERN_INVERT_MARK`] to request
/// `invert-match` semantics, or [`PATTERN_MATCH_MARK`]; both markers
/// are stripped before the rewrite.
///
/// # Errors
///
/// Returns a pattern error when the rewrite fails or the backend
/// rejects the rewritten expression.
pub fn compile_pattern(restr: &Restriction) -> Result<Arc<CompiledPattern>> {
    let (inverted, source) = match restr.arg.chars().next() {
        Some(PATTERN_INVERT_MARK) => (true, &restr.arg[PATTERN_INVERT_MARK.len_utf8()..]),
        Some(PATTERN_MATCH_MARK) => (false, &restr.arg[PATTERN_MATCH_MARK.len_utf8()..]),
        _ => (false, &*restr.arg),
    };

    let adapted = xsd_regex_to_anchored(source)?;
    let regex = regex::Regex::new(&format!("\\A{adapted}")).map_err(|err| YangError::Pattern {
        message: err.to_string(),
        pattern: Some(source.to_string()),
    })?;

    Ok(Arc::new(CompiledPattern {
        source: adapted,
        regex,
        inverted,
        error_message: restr.error_message.clone(),
        error_app_tag: restr.error_app_tag.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(arg: &str) -> Restriction {
        Restriction {
            arg: Arc::from(arg),
            ..Default::default()
        }
    }

    #[test]
    fn test_anchoring_wrap() {
        assert_eq!(xsd_regex_to_anchored("[a-z]+").unwrap(), "([a-z]+)$");
    }

    #[test]
    fn test_trailing_dot_star_stays_unanchored() {
        assert_eq!(xsd_regex_to_anchored("[a-z]+.*").unwrap(), "[a-z]+.*");
    }

    #[test]
    fn test_dollar_and_caret_escaped() {
        assert_eq!(xsd_regex_to_anchored("a$b^c").unwrap(), "(a\\$b\\^c)$");
    }

    #[test]
    fn test_block_expansion() {
        assert_eq!(
            xsd_regex_to_anchored("\\p{IsBasicLatin}*.*").unwrap(),
            "[\\x{0000}-\\x{007F}]*.*"
        );
    }

    #[test]
    fn test_block_inside_class_loses_brackets() {
        assert_eq!(
            xsd_regex_to_anchored("[\\p{IsGreek}0-9]+.*").unwrap(),
            "[\\x{0370}-\\x{03FF}0-9]+.*"
        );
    }

    #[test]
    fn test_unknown_block_rejected() {
        assert!(xsd_regex_to_anchored("\\p{IsKlingon}").is_err());
        assert!(xsd_regex_to_anchored("\\p{IsBasicLatin").is_err());
    }

    #[test]
    fn test_compile_and_match() {
        let compiled = compile_pattern(&pattern("[a-z]+")).unwrap();
        assert_eq!(compiled.source, "([a-z]+)$");
        assert!(compiled.matches("abc"));
        assert!(!compiled.matches("abc1"));
        assert!(!compiled.matches("1abc"));
        assert!(!compiled.inverted);
    }

    #[test]
    fn test_anchored_at_start_without_wrap() {
        let compiled = compile_pattern(&pattern("ab.*")).unwrap();
        assert!(compiled.matches("abXYZ"));
        assert!(!compiled.matches("Xab"));
    }

    #[test]
    fn test_inverted_marker() {
        let arg = format!("{PATTERN_INVERT_MARK}[0-9]+");
        let compiled = compile_pattern(&pattern(&arg)).unwrap();
        assert!(compiled.inverted);
        assert_eq!(compiled.source, "([0-9]+)$");
        assert!(compiled.matches("abc"));
        assert!(!compiled.matches("123"));
    }

    #[test]
    fn test_match_marker_stripped() {
        let arg = format!("{PATTERN_MATCH_MARK}[0-9]+");
        let compiled = compile_pattern(&pattern(&arg)).unwrap();
        assert!(!compiled.inverted);
        assert!(compiled.matches("42"));
    }

    #[test]
    fn test_dollar_matches_literally() {
        let compiled = compile_pattern(&pattern("a$b")).unwrap();
        assert!(compiled.matches("a$b"));
        assert!(!compiled.matches("ab"));
    }

    #[test]
    fn test_backend_error_reported() {
        let err = compile_pattern(&pattern("a{2,1}")).unwrap_err();
        assert!(matches!(err, YangError::Pattern { .. }));
    }
}
