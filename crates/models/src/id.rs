/// Id is the identity of a stored row: a signed 64-bit integer as assigned
/// by the backing store's sequence. The all-zero value is reserved as an
/// "absent" sentinel, used by references which may point at nothing (such as
/// a notification's comment).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type), sqlx(transparent))]
pub struct Id(i64);

impl Id {
    pub const ZERO: Id = Id(0);

    pub fn new(v: i64) -> Self {
        Self(v)
    }
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Id {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}
