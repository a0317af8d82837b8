use std::ops::Range;

/// A segment of the reading text: either a word or the whitespace between words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Separator(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(s) | Token::Separator(s) => s,
        }
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }

    /// Length in chars, the unit used by speech boundary offsets.
    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }
}

/// Ordered, lossless token sequence for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<Token>,
}

impl Tokens {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_word()).count()
    }

    /// Reference words in reading order, separators dropped.
    pub fn words(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.is_word())
            .map(Token::as_str)
            .collect()
    }

    /// Index of the last word token, if any.
    pub fn last_word_index(&self) -> Option<usize> {
        self.tokens.iter().rposition(Token::is_word)
    }

    /// Char span covered by each token.
    pub fn char_spans(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.tokens
            .iter()
            .map(|t| {
                let end = start + t.char_len();
                let span = start..end;
                start = end;
                span
            })
            .collect()
    }

    /// Text of the token slice beginning at `index`; empty past the end.
    pub fn text_from(&self, index: usize) -> String {
        self.tokens
            .get(index..)
            .unwrap_or_default()
            .iter()
            .map(Token::as_str)
            .collect()
    }

    pub fn concat(&self) -> String {
        self.text_from(0)
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Split text into alternating word and whitespace segments, keeping both.
pub fn tokenize(text: &str) -> Tokens {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_space = false;

    for c in text.chars() {
        let is_space = c.is_whitespace();
        if !current.is_empty() && is_space != in_space {
            tokens.push(make_token(std::mem::take(&mut current), in_space));
        }
        in_space = is_space;
        current.push(c);
    }

    if !current.is_empty() {
        tokens.push(make_token(current, in_space));
    }

    Tokens { tokens }
}

fn make_token(segment: String, is_space: bool) -> Token {
    if is_space {
        Token::Separator(segment)
    } else {
        Token::Word(segment)
    }
}

/// Lower-case a transcript and split it into spoken words.
pub fn split_spoken(transcript: &str) -> Vec<String> {
    transcript
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
