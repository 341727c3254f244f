//! Re-deriving grammar tokens from a compiled grammar

use super::{Flag, Grammar, PositionalSlot};

impl Grammar {
    /// Render the grammar back into tokens
    ///
    /// Flags come first in declaration order, then the positional slots.
    /// Implicit groups and named sets are not emitted: the former are
    /// recreated by compilation, the latter only existed while compiling.
    /// Compiling the result yields an [equivalent](Grammar::equivalent)
    /// grammar.
    pub fn to_tokens(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(flag_token)
            .chain(self.slots.iter().map(slot_token))
            .collect()
    }
}

fn flag_token(flag: &Flag) -> String {
    let mut token = String::new();

    if flag.has_explicit_group() {
        if let Some(group) = flag.group() {
            token.push('(');
            token.push_str(group);
            token.push(')');
        }
    }

    if flag.is_repeatable() {
        token.push('*');
    }

    match flag.spellings() {
        [single] => token.push_str(single),
        many => {
            token.push('{');
            token.push_str(&many.join(","));
            token.push('}');
        }
    }

    if !flag.chain().is_empty() {
        token.push(':');
        token.push_str(&flag.chain().to_token_suffix());
    }

    token
}

fn slot_token(slot: &PositionalSlot) -> String {
    let marker = if slot.is_repeatable() { "*" } else { "" };
    format!(":{marker}{}", slot.chain().to_token_suffix())
}
