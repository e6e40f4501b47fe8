//! Splitting review values into display pages.

use icp_common::ParserError;

/// Number of pages `value` takes at `width` characters per page.
pub fn page_count(value: &str, width: usize) -> Result<u8, ParserError> {
    if width == 0 {
        return Err(ParserError::UnexpectedError);
    }
    let chars = value.chars().count();
    u8::try_from(chars.div_ceil(width)).map_err(|_| ParserError::DisplayPageOutOfRange)
}

/// Returns page `page` of `value` and the page count.
///
/// A page past the end is empty.
pub fn page_string(value: &str, width: usize, page: u8) -> Result<(String, u8), ParserError> {
    let count = page_count(value, width)?;
    if page >= count {
        return Ok((String::new(), count));
    }
    let text = value
        .chars()
        .skip(page as usize * width)
        .take(width)
        .collect();
    Ok((text, count))
}
