use serde::Serialize;

use crate::ProtocolError;

/// Per-user properties the server attaches to member lists, peer joins,
/// login replies, and whois headers.
///
/// `gpc` (global privilege class) is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    /// Room privclass name (`pc`). Empty when the server did not send one.
    pub privclass: String,
    pub usericon: u32,
    /// Single-character rank glyph.
    pub symbol: Option<char>,
    pub realname: String,
    pub typename: String,
    pub gpc: String,
}

impl MemberInfo {
    /// Applies one `key=value` line.
    ///
    /// Unknown keys and unparsable `usericon` values are rejected; callers
    /// decide whether that is a warning or a hard failure.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ProtocolError> {
        match key {
            "pc" => self.privclass = value.to_owned(),
            "usericon" => {
                self.usericon = value.parse().map_err(|_| ProtocolError::InvalidField {
                    field: key.to_owned(),
                    value: value.to_owned(),
                })?;
            }
            "symbol" => self.symbol = value.chars().next(),
            "realname" => self.realname = value.to_owned(),
            "typename" => self.typename = value.to_owned(),
            "gpc" => self.gpc = value.to_owned(),
            _ => return Err(ProtocolError::UnknownField(key.to_owned())),
        }
        Ok(())
    }

    /// Builds from a block of `key=value` lines, skipping bad lines with a
    /// warning.
    pub fn from_lines(data: &str) -> Self {
        let mut info = Self::default();
        for (key, value) in crate::key_values(data) {
            if let Err(e) = info.set_field(key, value) {
                tracing::warn!(error = %e, "ignoring member property");
            }
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_reads_known_fields() {
        let info = MemberInfo::from_lines(
            "pc=Members\nusericon=3\nsymbol=~\nrealname=Alice A.\ntypename=Artist\ngpc=guest\n",
        );
        assert_eq!(info.privclass, "Members");
        assert_eq!(info.usericon, 3);
        assert_eq!(info.symbol, Some('~'));
        assert_eq!(info.realname, "Alice A.");
        assert_eq!(info.typename, "Artist");
        assert_eq!(info.gpc, "guest");
    }

    #[test]
    fn test_from_lines_skips_unknown_and_bad_fields() {
        let info = MemberInfo::from_lines("shoesize=44\nusericon=lots\nrealname=Bob\n");
        assert_eq!(info.usericon, 0);
        assert_eq!(info.realname, "Bob");
    }

    #[test]
    fn test_set_field_unknown_key_errors() {
        let mut info = MemberInfo::default();
        let err = info.set_field("bogus", "1").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownField(k) if k == "bogus"));
    }

    #[test]
    fn test_set_field_empty_symbol_is_none() {
        let mut info = MemberInfo::default();
        info.set_field("symbol", "").expect("known key");
        assert_eq!(info.symbol, None);
    }
}
