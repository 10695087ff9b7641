use serde::Serialize;

use crate::error::{CommandError, Result};

/// Size of a word slot. Words keep at most `MAX_STR_CMD_ARG_LEN - 1` bytes.
pub const MAX_STR_CMD_ARG_LEN: usize = 16;

/// Maximum number of arguments kept after the command word.
pub const MAX_STR_ARGV: usize = 4;

/// Bytes of input that are looked at; anything past this is ignored.
pub const MAX_INPUT_LEN: usize = MAX_STR_CMD_ARG_LEN * MAX_STR_ARGV;

const MAX_WORD_LEN: usize = MAX_STR_CMD_ARG_LEN - 1;

fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n')
}

/// A configuration string split into a command word and its arguments.
///
/// Parsing never fails because of too many words or words that are too
/// long: extra arguments are dropped and long words are truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandArgs {
    /// The command keyword (first word). Empty when the input had no words.
    pub cmd: String,
    /// Arguments following the keyword, at most [`MAX_STR_ARGV`].
    pub argv: Vec<String>,
}

impl CommandArgs {
    /// Tokenize a raw payload.
    ///
    /// The input ends at the first NUL byte or at the end of the slice.
    /// Words are separated by runs of spaces, CR or LF. Input that is not
    /// UTF-8 is rejected with [`CommandError::InvalidInput`].
    pub fn parse(input: &[u8]) -> Result<Self> {
        let end = input.iter().position(|&b| b == 0).unwrap_or(input.len());
        let bounded = &input[..end.min(MAX_INPUT_LEN)];
        let text = match std::str::from_utf8(bounded) {
            Ok(text) => text,
            // A multi-byte char cut by the length bound is not an error.
            Err(err) if err.error_len().is_none() => {
                std::str::from_utf8(&bounded[..err.valid_up_to()]).map_err(|_| {
                    CommandError::InvalidInput("payload is not valid UTF-8".to_string())
                })?
            }
            Err(_) => {
                return Err(CommandError::InvalidInput(
                    "payload is not valid UTF-8".to_string(),
                ))
            }
        };

        let mut words = text.split(is_delimiter).filter(|w| !w.is_empty());
        let cmd = words.next().map(truncate_word).unwrap_or_default();
        let argv: Vec<String> = words.take(MAX_STR_ARGV).map(truncate_word).collect();

        tracing::trace!(cmd = %cmd, argc = argv.len(), "command tokenized");
        Ok(Self { cmd, argv })
    }

    /// Tokenize a string.
    pub fn parse_str(input: &str) -> Result<Self> {
        Self::parse(input.as_bytes())
    }

    /// Number of arguments after the command word.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Whether the input contained no words at all.
    pub fn is_empty(&self) -> bool {
        self.cmd.is_empty()
    }

    /// Argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.argv.get(index).map(String::as_str)
    }
}

fn truncate_word(word: &str) -> String {
    if word.len() <= MAX_WORD_LEN {
        return word.to_string();
    }
    let mut cut = MAX_WORD_LEN;
    while !word.is_char_boundary(cut) {
        cut -= 1;
    }
    word[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_arguments() {
        let args = CommandArgs::parse_str("bauds 9600").unwrap();
        assert_eq!(args.cmd, "bauds");
        assert_eq!(args.argv, vec!["9600"]);
        assert_eq!(args.argc(), 1);
        assert_eq!(args.arg(0), Some("9600"));
        assert_eq!(args.arg(1), None);
    }

    #[test]
    fn single_word_has_no_arguments() {
        let args = CommandArgs::parse_str("enable").unwrap();
        assert_eq!(args.cmd, "enable");
        assert_eq!(args.argc(), 0);
        assert!(!args.is_empty());
    }

    #[test]
    fn empty_and_blank_input_have_no_words() {
        for input in ["", "   ", "\r\n", " \n \r "] {
            let args = CommandArgs::parse_str(input).unwrap();
            assert!(args.is_empty(), "{input:?}");
            assert_eq!(args.argc(), 0, "{input:?}");
        }
    }

    #[test]
    fn delimiter_runs_collapse() {
        let args = CommandArgs::parse_str("  bauds \r\n  115200\r\n").unwrap();
        assert_eq!(args.cmd, "bauds");
        assert_eq!(args.argv, vec!["115200"]);
    }

    #[test]
    fn tabs_are_not_delimiters() {
        let args = CommandArgs::parse_str("mode\traw").unwrap();
        assert_eq!(args.cmd, "mode\traw");
        assert_eq!(args.argc(), 0);
    }

    #[test]
    fn excess_words_are_dropped_silently() {
        let args = CommandArgs::parse_str("cmd a b c d e f g").unwrap();
        assert_eq!(args.cmd, "cmd");
        assert_eq!(args.argc(), MAX_STR_ARGV);
        assert_eq!(args.argv, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn exactly_max_arguments_are_kept() {
        let args = CommandArgs::parse_str("cmd a b c d").unwrap();
        assert_eq!(args.argc(), MAX_STR_ARGV);
        assert_eq!(args.arg(3), Some("d"));
    }

    #[test]
    fn word_at_slot_limit_is_intact() {
        let word = "x".repeat(MAX_STR_CMD_ARG_LEN - 1);
        let args = CommandArgs::parse_str(&format!("{word} {word}")).unwrap();
        assert_eq!(args.cmd, word);
        assert_eq!(args.argv, vec![word.clone()]);
    }

    #[test]
    fn word_filling_the_slot_is_truncated() {
        let word = "y".repeat(MAX_STR_CMD_ARG_LEN);
        let args = CommandArgs::parse_str(&format!("cmd {word}")).unwrap();
        assert_eq!(args.argv[0].len(), MAX_STR_CMD_ARG_LEN - 1);
        assert_eq!(args.argv[0], "y".repeat(MAX_STR_CMD_ARG_LEN - 1));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let word = format!("{}é", "a".repeat(MAX_STR_CMD_ARG_LEN - 2));
        assert_eq!(word.len(), MAX_STR_CMD_ARG_LEN);
        let args = CommandArgs::parse_str(&word).unwrap();
        assert_eq!(args.cmd, "a".repeat(MAX_STR_CMD_ARG_LEN - 2));
    }

    #[test]
    fn input_ends_at_nul() {
        let args = CommandArgs::parse(b"enable\0bauds 1").unwrap();
        assert_eq!(args.cmd, "enable");
        assert_eq!(args.argc(), 0);
    }

    #[test]
    fn input_beyond_bound_is_ignored() {
        let mut input = "a ".repeat(MAX_INPUT_LEN / 2);
        input.push_str("tail");
        let args = CommandArgs::parse_str(&input).unwrap();
        assert!(!args.argv.iter().any(|w| w == "tail"));
    }

    #[test]
    fn invalid_utf8_is_invalid_input() {
        let err = CommandArgs::parse(&[b'e', 0xFF, b'x']).unwrap_err();
        assert!(matches!(err, CommandError::InvalidInput(_)));
    }

    #[test]
    fn serializes_for_display() {
        let args = CommandArgs::parse_str("bauds 9600").unwrap();
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["cmd"], "bauds");
        assert_eq!(json["argv"][0], "9600");
    }
}
