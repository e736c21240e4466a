use serde::{Deserialize, Serialize};

/// Kind of a node in the public API tree.
///
/// The discriminants are persisted in the catalog's api table and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ApiKind {
    Namespace = 0,
    Interface = 1,
    Delegate = 2,
    Enum = 3,
    Struct = 4,
    Class = 5,
    Constant = 6,
    EnumItem = 7,
    Field = 8,
    Constructor = 9,
    Destructor = 10,
    Operator = 11,
    Property = 12,
    PropertyGetter = 13,
    PropertySetter = 14,
    Method = 15,
    Event = 16,
    EventAdder = 17,
    EventRemover = 18,
    EventRaiser = 19,
}

impl ApiKind {
    pub const ALL: [ApiKind; 20] = [
        ApiKind::Namespace,
        ApiKind::Interface,
        ApiKind::Delegate,
        ApiKind::Enum,
        ApiKind::Struct,
        ApiKind::Class,
        ApiKind::Constant,
        ApiKind::EnumItem,
        ApiKind::Field,
        ApiKind::Constructor,
        ApiKind::Destructor,
        ApiKind::Operator,
        ApiKind::Property,
        ApiKind::PropertyGetter,
        ApiKind::PropertySetter,
        ApiKind::Method,
        ApiKind::Event,
        ApiKind::EventAdder,
        ApiKind::EventRemover,
        ApiKind::EventRaiser,
    ];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub const fn is_type(self) -> bool {
        matches!(
            self,
            ApiKind::Interface
                | ApiKind::Delegate
                | ApiKind::Enum
                | ApiKind::Struct
                | ApiKind::Class
        )
    }

    pub const fn is_member(self) -> bool {
        matches!(
            self,
            ApiKind::Constant
                | ApiKind::EnumItem
                | ApiKind::Field
                | ApiKind::Constructor
                | ApiKind::Destructor
                | ApiKind::Operator
                | ApiKind::Property
                | ApiKind::Method
                | ApiKind::Event
        )
    }

    pub const fn is_accessor(self) -> bool {
        matches!(
            self,
            ApiKind::PropertyGetter
                | ApiKind::PropertySetter
                | ApiKind::EventAdder
                | ApiKind::EventRemover
                | ApiKind::EventRaiser
        )
    }
}

/// Declared accessibility as reported by the symbol provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Public,
    Protected,
    ProtectedOrInternal,
    ProtectedAndInternal,
    Internal,
    Private,
}

impl Accessibility {
    /// Whether a symbol with this accessibility is part of the public surface
    /// (callable or overridable from another assembly).
    pub const fn is_visible(self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::Protected | Accessibility::ProtectedOrInternal
        )
    }
}
