//! Status and kind enums stored as `TEXT` columns.
//!
//! The hosted store keeps these as plain strings; the enums give handlers a
//! closed set of values and carry the legal status transitions so they are
//! checked in one place instead of per endpoint.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Enum being parsed.
    pub kind: &'static str,
    /// Offending input.
    pub value: String,
}

/// Define a `snake_case` text enum with `Display`, `FromStr`, serde and
/// (with the `postgres` feature) sqlx text encoding.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored string form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $label,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a storefront order.
    ///
    /// ```text
    /// pending ──pay──▶ paid ──ship──▶ shipped ──confirm──▶ completed
    ///    └──cancel──▶ cancelled
    /// ```
    OrderStatus as "order status" {
        Pending => "pending",
        Paid => "paid",
        Shipped => "shipped",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Cancelled)
                | (Self::Paid, Self::Shipped)
                | (Self::Shipped, Self::Completed)
        )
    }
}

text_enum! {
    /// Lifecycle of a shop listing. `sold` and `withdrawn` are terminal.
    ListingStatus as "listing status" {
        Active => "active",
        Sold => "sold",
        Withdrawn => "withdrawn",
    }
}

impl ListingStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Active, Self::Sold | Self::Withdrawn))
    }
}

text_enum! {
    /// Publication state of a course. Only published courses are visible.
    CourseStatus as "course status" {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

text_enum! {
    /// Availability of a storefront product.
    ProductStatus as "product status" {
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    /// Category of an in-game item. At most one item per kind is equipped.
    ItemKind as "item kind" {
        Dye => "dye",
        Tool => "tool",
        Decoration => "decoration",
    }
}

text_enum! {
    /// Reason for a coin balance change.
    TransactionKind as "transaction kind" {
        ItemPurchase => "item_purchase",
        ListingSale => "listing_sale",
        ListingPurchase => "listing_purchase",
        TaskReward => "task_reward",
    }
}

text_enum! {
    /// How a coupon reduces the order subtotal.
    CouponKind as "coupon kind" {
        /// `value` is a percentage (0, 100].
        Percent => "percent",
        /// `value` is an amount in yuan.
        Fixed => "fixed",
    }
}

text_enum! {
    /// Player actions that advance task progress.
    TaskAction as "task action" {
        CraftWork => "craft_work",
        CreateListing => "create_listing",
        EnrollCourse => "enroll_course",
        PlaceOrder => "place_order",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_transitions() {
        use OrderStatus::{Cancelled, Completed, Paid, Pending, Shipped};

        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));

        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_listing_terminal_states() {
        for next in ListingStatus::ALL {
            assert!(!ListingStatus::Sold.can_transition_to(*next));
            assert!(!ListingStatus::Withdrawn.can_transition_to(*next));
        }
        assert!(ListingStatus::Active.can_transition_to(ListingStatus::Withdrawn));
    }

    #[test]
    fn test_text_roundtrip_matches_serde() {
        for kind in TransactionKind::ALL {
            let parsed: TransactionKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, *kind);
            assert_eq!(
                serde_json::to_string(kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "teleported".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: teleported");
    }
}
