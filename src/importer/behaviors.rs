//! Parses the behaviours header that maps `MB_*` symbols to their numeric
//! ids. Only `#define NAME VALUE` lines matter; include guards, comments
//! and anything else a C header carries are skipped.

use std::collections::HashMap;

pub type BehaviourMap = HashMap<String, u16>;

/// Parse a decimal or `0x`-prefixed hexadecimal literal.
pub fn parse_int(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

pub fn parse_behaviors_header(text: &str) -> BehaviourMap {
    let mut behaviours = BehaviourMap::new();
    for line in text.lines() {
        let Some(rest) = line.trim().strip_prefix("#define") else {
            continue;
        };
        let mut tokens = rest.split_whitespace();
        let (Some(name), Some(value)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        if let Some(value) = parse_int(value) {
            behaviours.insert(name.to_string(), value);
        }
    }
    behaviours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_parse_in_both_bases() {
        let header = "\
#ifndef GUARD_METATILE_BEHAVIORS_H
#define GUARD_METATILE_BEHAVIORS_H

#define MB_NORMAL 0x00
#define MB_TALL_GRASS 0x02
#define MB_DEEP_SAND 6
// #define MB_COMMENTED 0x09

#endif // GUARD_METATILE_BEHAVIORS_H
";
        let behaviours = parse_behaviors_header(header);
        assert_eq!(behaviours["MB_NORMAL"], 0);
        assert_eq!(behaviours["MB_TALL_GRASS"], 2);
        assert_eq!(behaviours["MB_DEEP_SAND"], 6);
        assert!(!behaviours.contains_key("MB_COMMENTED"));
        // The bare include-guard define has no value and is skipped.
        assert!(!behaviours.contains_key("GUARD_METATILE_BEHAVIORS_H"));
    }
}
