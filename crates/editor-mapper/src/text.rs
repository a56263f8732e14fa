/// Byte index of the `char_offset`-th `char` of `text` (`text.len()` for the end).
pub(crate) fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}
