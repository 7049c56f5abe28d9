//! Beacon filter rules for Messenger
//!
//! Each category gets its own rule list so that it can be toggled independently.

use chatwave_core::prefs::BlockPrefs;

/// Beacon categories suppressed by the request filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeaconCategory {
    /// "X is typing..." pings
    TypingIndicator,
    /// Seen/read status updates
    ReadStatus,
    /// Delivery receipts and unread-thread acknowledgements
    DeliveryReceipt,
}

impl BeaconCategory {
    pub const ALL: [BeaconCategory; 3] = [
        BeaconCategory::TypingIndicator,
        BeaconCategory::ReadStatus,
        BeaconCategory::DeliveryReceipt,
    ];

    /// Network filter rules for this category
    pub fn rules(&self) -> &'static [&'static str] {
        match self {
            BeaconCategory::TypingIndicator => &["||messenger.com/*typ.php"],
            BeaconCategory::ReadStatus => &["||messenger.com/*change_read_status.php"],
            BeaconCategory::DeliveryReceipt => &[
                "||messenger.com/*delivery_receipts",
                "||messenger.com/*unread_threads",
            ],
        }
    }

    /// Whether the user asked for this category to be blocked
    pub fn is_blocked(&self, prefs: &BlockPrefs) -> bool {
        match self {
            BeaconCategory::TypingIndicator => prefs.typing_indicator,
            BeaconCategory::ReadStatus => prefs.chat_seen,
            BeaconCategory::DeliveryReceipt => prefs.delivery_receipt,
        }
    }

    /// Path fragments the page bridge uses to pre-select candidate requests
    pub fn url_markers() -> &'static [&'static str] {
        &[
            "typ.php",
            "change_read_status.php",
            "delivery_receipts",
            "unread_threads",
        ]
    }
}
