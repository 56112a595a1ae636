//! The transaction data model: object references with read/write intent and
//! the immutable transaction descriptor that flows through the scheduler.

/// Maximum number of object references a single transaction may carry.
pub const MAX_TXN_OBJS: usize = 16;

const WRITE_BIT: u64 = 1 << 63;
const ID_MASK: u64 = WRITE_BIT - 1;

/// A reference to a named object, packed into 64 bits: the identifier in the
/// low 63 bits and write-intent in the top bit.
///
/// Equality and conflict checks compare identifiers with the intent bit
/// masked; two references conflict only when at least one side carries
/// write-intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// A read reference to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not fit in 63 bits.
    #[inline]
    pub fn read(id: u64) -> Self {
        assert!(id <= ID_MASK, "object id {id:#x} exceeds 63 bits");
        Self(id)
    }

    /// A write reference to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not fit in 63 bits.
    #[inline]
    pub fn write(id: u64) -> Self {
        assert!(id <= ID_MASK, "object id {id:#x} exceeds 63 bits");
        Self(id | WRITE_BIT)
    }

    /// The object identifier, intent bit masked off.
    #[inline]
    pub fn id(self) -> u64 {
        self.0 & ID_MASK
    }

    #[inline]
    pub fn is_write(self) -> bool {
        self.0 & WRITE_BIT != 0
    }

    /// True iff both sides name the same object and at least one writes it.
    #[inline]
    pub fn conflicts_with(self, other: ObjectRef) -> bool {
        self.id() == other.id() && (self.is_write() || other.is_write())
    }
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TxnId(pub u64);

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

/// An immutable transaction descriptor.
///
/// Carries an opaque id, a 64-bit auxiliary payload the core never
/// interprets, and up to [`MAX_TXN_OBJS`] object references held inline so
/// the descriptor stays `Copy` and moves through rings without allocation.
///
/// The object sequence must not contain duplicate identifiers; the core
/// does not enforce this, and a violation only inflates conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    id: TxnId,
    aux: u64,
    len: u8,
    objs: [ObjectRef; MAX_TXN_OBJS],
}

impl Transaction {
    /// Builds a descriptor over the given object references.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_TXN_OBJS`] references are given.
    pub fn new(id: TxnId, objs: &[ObjectRef]) -> Self {
        assert!(
            objs.len() <= MAX_TXN_OBJS,
            "transaction {id} carries {} object refs, limit is {MAX_TXN_OBJS}",
            objs.len()
        );
        let mut inline = [ObjectRef(0); MAX_TXN_OBJS];
        inline[..objs.len()].copy_from_slice(objs);
        Self {
            id,
            aux: 0,
            len: objs.len() as u8,
            objs: inline,
        }
    }

    /// Attaches a caller-defined auxiliary payload.
    #[inline]
    pub fn with_aux(mut self, aux: u64) -> Self {
        self.aux = aux;
        self
    }

    #[inline]
    pub fn id(&self) -> TxnId {
        self.id
    }

    #[inline]
    pub fn aux(&self) -> u64 {
        self.aux
    }

    /// The object references, in submission order.
    #[inline]
    pub fn objects(&self) -> &[ObjectRef] {
        &self.objs[..self.len as usize]
    }

    /// Exact pairwise conflict predicate: some object appears on both sides
    /// and at least one of the two appearances has write-intent.
    pub fn conflicts_with(&self, other: &Transaction) -> bool {
        self.objects()
            .iter()
            .any(|a| other.objects().iter().any(|b| a.conflicts_with(*b)))
    }
}
