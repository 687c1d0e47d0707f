/// Splits a free-text street address into `(street, house_number)`.
///
/// This is a best-effort heuristic, not a postal address validator. The last space that is followed by a digit
/// separates the street from the house number (`"Teststraat 123a"`). Failing that, an address that starts with a
/// digit is read house number first (`"12 Main Street"`). Anything else is returned whole as the street.
pub fn parse_street_address(street_address: &str) -> (String, String) {
    let split = street_address
        .char_indices()
        .rev()
        .filter(|(_, c)| *c == ' ')
        .find(|(i, _)| street_address[i + 1..].chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false));
    if let Some((i, _)) = split {
        let house_number = street_address[i + 1..].trim();
        if !house_number.is_empty() {
            return (street_address[..i].trim().to_string(), house_number.to_string());
        }
    }
    let starts_with_digit = street_address.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false);
    if starts_with_digit {
        if let Some(i) = street_address.find(' ') {
            let house_number = street_address[..i].trim_matches(|c: char| ", \t\n\r\0\x0B".contains(c));
            return (street_address[i + 1..].trim().to_string(), house_number.to_string());
        }
    }
    (street_address.to_string(), String::new())
}
