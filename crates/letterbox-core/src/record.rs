// ABOUTME: Tagged-row codec that maps a User to and from discriminator-first records.
// ABOUTME: Detail, contact, received and sent rows share one file; unknown tags are skipped.

use std::num::ParseIntError;

use thiserror::Error;

use crate::model::User;

pub const TAG_DETAIL: &str = "D";
pub const TAG_CONTACT: &str = "C";
pub const TAG_RECEIVED: &str = "R";
pub const TAG_SENT: &str = "S";

const NOTIFY_OFF: &str = "0";
const NOTIFY_ON: &str = "1";

/// Errors raised while turning raw fields back into records.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed row: tag {tag:?} needs {expected} fields, found {found}")]
    MalformedRow {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed record: tag {tag:?} has non-integer id {value:?}")]
    MalformedRecord {
        tag: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// One row of a user file. The first field of every row is its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Detail {
        handle: String,
        password: String,
        email: String,
        notify_by_email: bool,
    },
    Contact(String),
    Received(i64),
    Sent(i64),
    /// A row whose tag this version does not know. Kept so readers can
    /// skip it instead of failing.
    Unknown(String),
}

impl Record {
    /// The discriminator written in field 0.
    pub fn tag(&self) -> &str {
        match self {
            Record::Detail { .. } => TAG_DETAIL,
            Record::Contact(_) => TAG_CONTACT,
            Record::Received(_) => TAG_RECEIVED,
            Record::Sent(_) => TAG_SENT,
            Record::Unknown(tag) => tag,
        }
    }

    /// Render the record as the ordered fields of one row.
    pub fn to_fields(&self) -> Vec<String> {
        let tag = self.tag().to_string();
        match self {
            Record::Detail {
                handle,
                password,
                email,
                notify_by_email,
            } => {
                let flag = if *notify_by_email { NOTIFY_ON } else { NOTIFY_OFF };
                vec![
                    tag,
                    handle.clone(),
                    password.clone(),
                    email.clone(),
                    flag.to_string(),
                ]
            }
            Record::Contact(handle) => vec![tag, handle.clone()],
            Record::Received(id) | Record::Sent(id) => vec![tag, id.to_string()],
            Record::Unknown(_) => vec![tag],
        }
    }

    /// Parse one row. Extra trailing fields are ignored; missing ones are
    /// an error.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, CodecError> {
        let Some(tag) = fields.first().map(|f| f.as_ref()) else {
            return Err(CodecError::MalformedRow {
                tag: String::new(),
                expected: 1,
                found: 0,
            });
        };

        match tag {
            TAG_DETAIL => {
                let [_, handle, password, email, flag] = require::<_, 5>(tag, fields)?;
                Ok(Record::Detail {
                    handle: handle.to_string(),
                    password: password.to_string(),
                    email: email.to_string(),
                    // Anything other than a literal "0" counts as on.
                    notify_by_email: flag != NOTIFY_OFF,
                })
            }
            TAG_CONTACT => {
                let [_, handle] = require::<_, 2>(tag, fields)?;
                Ok(Record::Contact(handle.to_string()))
            }
            TAG_RECEIVED => {
                let [_, id] = require::<_, 2>(tag, fields)?;
                Ok(Record::Received(parse_id(tag, id)?))
            }
            TAG_SENT => {
                let [_, id] = require::<_, 2>(tag, fields)?;
                Ok(Record::Sent(parse_id(tag, id)?))
            }
            other => Ok(Record::Unknown(other.to_string())),
        }
    }
}

/// Borrow the first `N` fields of a row, or fail if the row is shorter.
fn require<'a, S: AsRef<str>, const N: usize>(
    tag: &str,
    fields: &'a [S],
) -> Result<[&'a str; N], CodecError> {
    if fields.len() < N {
        return Err(CodecError::MalformedRow {
            tag: tag.to_string(),
            expected: N,
            found: fields.len(),
        });
    }
    Ok(std::array::from_fn(|i| fields[i].as_ref()))
}

fn parse_id(tag: &str, value: &str) -> Result<i64, CodecError> {
    value
        .parse::<i64>()
        .map_err(|source| CodecError::MalformedRecord {
            tag: tag.to_string(),
            value: value.to_string(),
            source,
        })
}

impl User {
    /// Fold one record into this user. Detail rows overwrite the scalar
    /// fields; the other kinds append in the order they are applied.
    pub fn apply(&mut self, record: Record) {
        match record {
            Record::Detail {
                handle,
                password,
                email,
                notify_by_email,
            } => {
                self.handle = handle;
                self.password = password;
                self.email = email;
                self.notify_by_email = notify_by_email;
            }
            Record::Contact(handle) => self.rolodex.push(handle),
            Record::Received(id) => self.mailbox_cache.push(id),
            Record::Sent(id) => self.sent_cache.push(id),
            Record::Unknown(tag) => {
                tracing::trace!("skipping row with unknown tag {:?}", tag);
            }
        }
    }
}

/// Encode a user as its canonical row sequence: the detail row, then
/// contacts ascending, then received ids descending, then sent ids
/// descending. Sorting happens on copies; `user` is left as it was.
pub fn encode_user(user: &User) -> Vec<Record> {
    let mut rolodex = user.rolodex.clone();
    rolodex.sort();
    let mut received = user.mailbox_cache.clone();
    received.sort_unstable_by(|a, b| b.cmp(a));
    let mut sent = user.sent_cache.clone();
    sent.sort_unstable_by(|a, b| b.cmp(a));

    let mut records = Vec::with_capacity(1 + rolodex.len() + received.len() + sent.len());
    records.push(Record::Detail {
        handle: user.handle.clone(),
        password: user.password.clone(),
        email: user.email.clone(),
        notify_by_email: user.notify_by_email,
    });
    records.extend(rolodex.into_iter().map(Record::Contact));
    records.extend(received.into_iter().map(Record::Received));
    records.extend(sent.into_iter().map(Record::Sent));
    records
}

/// Decode rows of raw fields into a user. Rows may arrive in any order and
/// with any mix of kinds. A missing detail row leaves the scalar fields at
/// their defaults.
pub fn decode_user<I, R, S>(rows: I) -> Result<User, CodecError>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut user = User::default();
    for row in rows {
        user.apply(Record::from_fields(row.as_ref())?);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(records: &[Record]) -> Vec<Vec<String>> {
        records.iter().map(Record::to_fields).collect()
    }

    fn sample_user() -> User {
        let mut user = User::new("alice", "p@ss, word", "alice@example.com");
        user.notify_by_email = true;
        user.rolodex = vec!["carol".into(), "bob".into(), "dave".into()];
        user.mailbox_cache = vec![3, 17, 5];
        user.sent_cache = vec![2, 9];
        user
    }

    #[test]
    fn encode_emits_groups_in_canonical_order() {
        let rows = fields(&encode_user(&sample_user()));

        let expected: Vec<Vec<&str>> = vec![
            vec!["D", "alice", "p@ss, word", "alice@example.com", "1"],
            vec!["C", "bob"],
            vec!["C", "carol"],
            vec!["C", "dave"],
            vec!["R", "17"],
            vec!["R", "5"],
            vec!["R", "3"],
            vec!["S", "9"],
            vec!["S", "2"],
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn encode_leaves_caller_collections_untouched() {
        let user = sample_user();
        let before = user.clone();

        let _ = encode_user(&user);

        assert_eq!(user, before);
    }

    #[test]
    fn encode_writes_zero_flag_when_notifications_off() {
        let user = User::new("bob", "pw", "bob@example.com");
        let rows = fields(&encode_user(&user));

        assert_eq!(rows, vec![vec!["D", "bob", "pw", "bob@example.com", "0"]]);
    }

    #[test]
    fn decode_of_encode_yields_sorted_user() {
        let user = sample_user();

        let decoded = decode_user(fields(&encode_user(&user))).unwrap();

        assert_eq!(decoded.handle, user.handle);
        assert_eq!(decoded.password, user.password);
        assert_eq!(decoded.email, user.email);
        assert!(decoded.notify_by_email);
        assert_eq!(decoded.rolodex, vec!["bob", "carol", "dave"]);
        assert_eq!(decoded.mailbox_cache, vec![17, 5, 3]);
        assert_eq!(decoded.sent_cache, vec![9, 2]);
    }

    #[test]
    fn decode_keeps_file_order_and_interleaving() {
        let rows = vec![
            vec!["R", "1"],
            vec!["C", "zed"],
            vec!["D", "alice", "pw", "a@example.com", "0"],
            vec!["R", "4"],
            vec!["C", "amy"],
            vec!["S", "-2"],
        ];

        let user = decode_user(rows).unwrap();

        assert_eq!(user.handle, "alice");
        assert_eq!(user.rolodex, vec!["zed", "amy"]);
        assert_eq!(user.mailbox_cache, vec![1, 4]);
        assert_eq!(user.sent_cache, vec![-2]);
    }

    #[test]
    fn decode_keeps_duplicate_contacts() {
        let rows = vec![vec!["C", "bob"], vec!["C", "bob"]];

        let user = decode_user(rows).unwrap();

        assert_eq!(user.rolodex, vec!["bob", "bob"]);
    }

    #[test]
    fn notify_flag_is_permissive() {
        for (flag, expected) in [("0", false), ("1", true), ("x", true), ("", true)] {
            let rows = vec![vec!["D", "alice", "pw", "a@example.com", flag]];
            let user = decode_user(rows).unwrap();
            assert_eq!(user.notify_by_email, expected, "flag {:?}", flag);
        }
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let rows = vec![
            vec!["D", "alice", "pw", "a@example.com", "1"],
            vec!["X", "foo"],
            vec!["Z"],
            vec!["C", "bob"],
        ];

        let user = decode_user(rows).unwrap();

        assert_eq!(user.handle, "alice");
        assert_eq!(user.rolodex, vec!["bob"]);
        assert!(user.mailbox_cache.is_empty());
        assert!(user.sent_cache.is_empty());
    }

    #[test]
    fn last_detail_row_wins() {
        let rows = vec![
            vec!["D", "alice", "p1", "e1", "0"],
            vec!["D", "alice", "p2", "e2", "1"],
        ];

        let user = decode_user(rows).unwrap();

        assert_eq!(user.password, "p2");
        assert_eq!(user.email, "e2");
        assert!(user.notify_by_email);
    }

    #[test]
    fn missing_detail_row_gives_default_scalars() {
        let rows = vec![vec!["C", "bob"], vec!["S", "7"]];

        let user = decode_user(rows).unwrap();

        assert_eq!(user.handle, "");
        assert_eq!(user.password, "");
        assert_eq!(user.email, "");
        assert!(!user.notify_by_email);
        assert_eq!(user.rolodex, vec!["bob"]);
        assert_eq!(user.sent_cache, vec![7]);
    }

    #[test]
    fn non_integer_id_is_malformed_record() {
        let err = decode_user(vec![vec!["R", "abc"]]).unwrap_err();
        match err {
            CodecError::MalformedRecord { tag, value, .. } => {
                assert_eq!(tag, "R");
                assert_eq!(value, "abc");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }

        let err = decode_user(vec![vec!["S", "12x"]]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedRecord { .. }));
    }

    #[test]
    fn short_rows_are_malformed() {
        let cases: Vec<(Vec<&str>, usize)> = vec![
            (vec!["D", "alice", "pw", "a@example.com"], 5),
            (vec!["D"], 5),
            (vec!["C"], 2),
            (vec!["R"], 2),
            (vec!["S"], 2),
        ];

        for (row, expected_len) in cases {
            let found_len = row.len();
            let err = Record::from_fields(row.as_slice()).unwrap_err();
            match err {
                CodecError::MalformedRow {
                    expected, found, ..
                } => {
                    assert_eq!(expected, expected_len);
                    assert_eq!(found, found_len);
                }
                other => panic!("expected MalformedRow for {:?}, got {:?}", row, other),
            }
        }
    }

    #[test]
    fn empty_row_is_malformed() {
        let row: Vec<&str> = Vec::new();
        let err = Record::from_fields(row.as_slice()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedRow { found: 0, .. }));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = Record::from_fields(&["C", "bob", "trailing"][..]).unwrap();
        assert_eq!(record, Record::Contact("bob".to_string()));
    }

    #[test]
    fn errors_abort_decoding() {
        let rows = vec![
            vec!["D", "alice", "pw", "a@example.com", "1"],
            vec!["R", "1"],
            vec!["R", "nope"],
            vec!["R", "2"],
        ];

        assert!(decode_user(rows).is_err());
    }
}
