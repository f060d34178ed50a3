//! Tag Index Module
//!
//! Maintains, per tag, the list of fully-qualified keys written under it.
//! Membership updates are read-append-write with no compare-and-swap, so
//! concurrent appends to one tag can lose updates.

use std::time::Duration;

use crate::cache::Backend;
use crate::error::Result;

// == Tag Members ==
/// Ordered member keys of one tag, stored as a comma-joined string.
/// Commas and percent signs inside a member are written as `%2C` and
/// `%25` so query strings like `?ids=1,2` survive the round trip.
/// Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMembers {
    keys: Vec<String>,
}

impl TagMembers {
    /// Parses a comma-joined list; empty segments are dropped.
    pub fn decode(raw: &[u8]) -> Self {
        let keys = String::from_utf8_lossy(raw)
            .split(',')
            .filter(|k| !k.is_empty())
            .map(unescape_member)
            .collect();
        Self { keys }
    }

    pub fn encode(&self) -> String {
        self.keys
            .iter()
            .map(|key| escape_member(key))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn escape_member(key: &str) -> String {
    key.replace('%', "%25").replace(',', "%2C")
}

/// Single pass so `%252C` decodes to `%2C` rather than `,`. Unknown
/// escapes are kept verbatim.
fn unescape_member(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if tail.starts_with("%2C") {
            out.push(',');
            rest = &tail[3..];
        } else if tail.starts_with("%25") {
            out.push('%');
            rest = &tail[3..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

// == Add Tags ==
/// Appends `member` to each tag entry in `tag_keys`.
///
/// Tag entries live `member_ttl + margin` so they outlast what they index.
pub fn add_tags(
    backend: &dyn Backend,
    tag_keys: &[String],
    member: &str,
    member_ttl: Option<Duration>,
    margin: Duration,
) -> Result<()> {
    let tag_ttl = member_ttl.map(|ttl| ttl.saturating_add(margin));

    for tag_key in tag_keys {
        let mut members = backend
            .read(tag_key)?
            .map(|raw| TagMembers::decode(&raw))
            .unwrap_or_default();
        members.push(member);
        backend.write(tag_key, members.encode().as_bytes(), tag_ttl)?;
    }
    Ok(())
}

// == Sweep Tag ==
/// Deletes every member of the tag, then the tag entry itself.
///
/// Returns how many member entries were actually removed. A missing tag is
/// a no-op.
pub fn sweep_tag(backend: &dyn Backend, tag_key: &str) -> Result<usize> {
    let Some(raw) = backend.read(tag_key)? else {
        return Ok(0);
    };

    let mut removed = 0;
    for member in TagMembers::decode(&raw).iter() {
        if backend.delete(member)? {
            removed += 1;
        }
    }
    backend.delete(tag_key)?;
    Ok(removed)
}
