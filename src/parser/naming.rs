//! Identifier helpers shared by the parsers

/// Converts `detach-keys`, `no_trunc` or `output type` to `DetachKeys`, `NoTrunc`, `OutputType`
///
/// Only the first letter of each word is changed, so `outputType` becomes `OutputType`.
pub fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Strips a JSON pointer prefix from a `$ref` (`#/components/schemas/Foo` -> `Foo`)
pub fn reference_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}
