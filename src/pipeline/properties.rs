//! MAPI property store decoder.
//!
//! Every message, attachment and embedded message storage in a `.msg`
//! container carries a `__properties_version1.0` stream: a short header
//! followed by fixed 16-byte records.
//!
//! ```text
//! offset  size  field
//! 0       2     property type  (u16 LE)
//! 2       2     property tag   (u16 LE)
//! 4       4     flags          (ignored)
//! 8       8     inline value, or a placeholder for variable-length types
//! ```
//!
//! The header is 32 bytes for the top-level message and 24 bytes for
//! attachment and embedded-message storages. Getting that wrong shifts every
//! record by half a slot, so the flag is threaded through explicitly.
//!
//! Variable-length values live in a sibling stream named
//! `__substg1.0_<TAG><TYPE>` (uppercase hex, four digits each). Embedded
//! messages live in a sibling *storage* with the same naming and are decoded
//! recursively through [`crate::pipeline::msg::normalize_entry`].
//!
//! Tags missing from [`PROPERTY_TAGS`] and type codes without a decoder are
//! skipped: producers add private properties freely.

use crate::error::ConvertError;
use crate::message::MailMessage;
use crate::pipeline::container::{join_path, RawContainer};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the property stream inside every message/attachment storage.
pub const PROPERTIES_STREAM: &str = "__properties_version1.0";

pub const TOP_LEVEL_HEADER_LEN: usize = 32;
pub const NESTED_HEADER_LEN: usize = 24;
const RECORD_LEN: usize = 16;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// The closed set of property types this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Null,
    Integer16,
    Integer32,
    Boolean,
    EmbeddedMessage,
    Integer64,
    String8,
    Unicode,
    Time,
    Binary,
}

impl PropertyType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => Self::Null,
            0x0002 => Self::Integer16,
            0x0003 => Self::Integer32,
            0x000B => Self::Boolean,
            0x000D => Self::EmbeddedMessage,
            0x0014 => Self::Integer64,
            0x001E => Self::String8,
            0x001F => Self::Unicode,
            0x0040 => Self::Time,
            0x0102 => Self::Binary,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Null => 0x0001,
            Self::Integer16 => 0x0002,
            Self::Integer32 => 0x0003,
            Self::Boolean => 0x000B,
            Self::EmbeddedMessage => 0x000D,
            Self::Integer64 => 0x0014,
            Self::String8 => 0x001E,
            Self::Unicode => 0x001F,
            Self::Time => 0x0040,
            Self::Binary => 0x0102,
        }
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Null,
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    String(String),
    Binary(Vec<u8>),
    Message(Box<MailMessage>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Binary(b) => Some(b),
            _ => None,
        }
    }
}

/// Decoded properties keyed by their static-table name.
pub type PropertyMap = BTreeMap<&'static str, PropertyValue>;

/// Per-container state threaded through the recursive decode.
#[derive(Debug)]
pub struct DecodeContext {
    depth: usize,
    max_depth: usize,
    /// Running counter for `unknown_N` attachment names, shared by every
    /// message in the container.
    unknown_attachments: usize,
}

impl DecodeContext {
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
            unknown_attachments: 0,
        }
    }

    pub fn next_unknown_index(&mut self) -> usize {
        self.unknown_attachments += 1;
        self.unknown_attachments
    }

    /// Run `f` one embedding level deeper.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        if self.depth >= self.max_depth {
            return Err(ConvertError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Look up the name of a tag in the static table.
pub fn tag_name(tag: u16) -> Option<&'static str> {
    PROPERTY_TAGS
        .binary_search_by_key(&tag, |&(code, _)| code)
        .ok()
        .map(|i| PROPERTY_TAGS[i].1)
}

/// Companion stream (or storage) name for a variable-length property.
pub fn companion_name(tag: u16, ptype: u16) -> String {
    format!("__substg1.0_{tag:04X}{ptype:04X}")
}

/// Decode the property stream of the message or attachment storage `entry_path`.
///
/// A storage without a property stream yields an empty map.
pub fn decode_properties(
    container: &RawContainer,
    entry_path: &str,
    is_top_level: bool,
    ctx: &mut DecodeContext,
) -> Result<PropertyMap, ConvertError> {
    let mut props = PropertyMap::new();
    let Some(stream) = container.find(&join_path(entry_path, PROPERTIES_STREAM)) else {
        debug!("No property stream under '{}'", entry_path);
        return Ok(props);
    };

    let header = if is_top_level {
        TOP_LEVEL_HEADER_LEN
    } else {
        NESTED_HEADER_LEN
    };
    let data = stream.data();
    if data.len() <= header {
        return Ok(props);
    }

    for record in data[header..].chunks_exact(RECORD_LEN) {
        let type_code = u16::from_le_bytes([record[0], record[1]]);
        let tag = u16::from_le_bytes([record[2], record[3]]);
        let mut slot = [0u8; 8];
        slot.copy_from_slice(&record[8..16]);

        let (Some(name), Some(ptype)) = (tag_name(tag), PropertyType::from_code(type_code)) else {
            continue;
        };

        let value = match ptype {
            PropertyType::Null => Some(PropertyValue::Null),
            PropertyType::Integer16 => Some(PropertyValue::Int16(i16::from_le_bytes([
                slot[0], slot[1],
            ]))),
            PropertyType::Integer32 => Some(PropertyValue::Int32(i32::from_le_bytes([
                slot[0], slot[1], slot[2], slot[3],
            ]))),
            PropertyType::Integer64 => Some(PropertyValue::Int64(i64::from_le_bytes(slot))),
            PropertyType::Boolean => Some(PropertyValue::Bool(slot[0] == 1)),
            PropertyType::Time => filetime_to_utc(u64::from_le_bytes(slot)).map(PropertyValue::Time),
            PropertyType::String8 | PropertyType::Unicode | PropertyType::Binary => {
                let path = join_path(entry_path, &companion_name(tag, type_code));
                match container.find(&path) {
                    Some(entry) => Some(decode_variable(ptype, entry.data())),
                    None => {
                        debug!("Property {} has no companion stream '{}'", name, path);
                        None
                    }
                }
            }
            PropertyType::EmbeddedMessage => {
                let path = join_path(entry_path, &companion_name(tag, type_code));
                let nested = ctx.nested(|ctx| {
                    crate::pipeline::msg::normalize_entry(container, &path, false, ctx)
                })?;
                Some(PropertyValue::Message(Box::new(nested)))
            }
        };

        if let Some(value) = value {
            props.insert(name, value);
        }
    }

    Ok(props)
}

fn decode_variable(ptype: PropertyType, data: &[u8]) -> PropertyValue {
    match ptype {
        PropertyType::String8 => PropertyValue::String(String::from_utf8_lossy(data).into_owned()),
        PropertyType::Unicode => {
            let units = data
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]));
            PropertyValue::String(
                char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect(),
            )
        }
        _ => PropertyValue::Binary(data.to_vec()),
    }
}

/// 100-ns ticks since 1601-01-01T00:00:00Z → UTC timestamp.
pub fn filetime_to_utc(ticks: u64) -> Option<DateTime<Utc>> {
    let secs = (ticks / 10_000_000) as i64 - FILETIME_UNIX_OFFSET_SECS;
    let nanos = ((ticks % 10_000_000) * 100) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

/// Known property tags. Sorted by code for binary search.
pub static PROPERTY_TAGS: &[(u16, &str)] = &[
    (0x0001, "ACKNOWLEDGEMENT_MODE"),
    (0x0002, "ALTERNATE_RECIPIENT_ALLOWED"),
    (0x0003, "AUTHORIZING_USERS"),
    (0x0004, "AUTO_FORWARD_COMMENT"),
    (0x0005, "AUTO_FORWARDED"),
    (0x0006, "CONTENT_CONFIDENTIALITY_ALGORITHM_ID"),
    (0x0007, "CONTENT_CORRELATOR"),
    (0x0008, "CONTENT_IDENTIFIER"),
    (0x0009, "CONTENT_LENGTH"),
    (0x000A, "CONTENT_RETURN_REQUESTED"),
    (0x000B, "CONVERSATION_KEY"),
    (0x000C, "CONVERSION_EITS"),
    (0x000D, "CONVERSION_WITH_LOSS_PROHIBITED"),
    (0x000E, "CONVERTED_EITS"),
    (0x000F, "DEFERRED_DELIVERY_TIME"),
    (0x0010, "DELIVER_TIME"),
    (0x0011, "DISCARD_REASON"),
    (0x0012, "DISCLOSURE_OF_RECIPIENTS"),
    (0x0013, "DL_EXPANSION_HISTORY"),
    (0x0014, "DL_EXPANSION_PROHIBITED"),
    (0x0015, "EXPIRY_TIME"),
    (0x0016, "IMPLICIT_CONVERSION_PROHIBITED"),
    (0x0017, "IMPORTANCE"),
    (0x0018, "IPM_ID"),
    (0x0019, "LATEST_DELIVERY_TIME"),
    (0x001A, "MESSAGE_CLASS"),
    (0x001B, "MESSAGE_DELIVERY_ID"),
    (0x001E, "MESSAGE_SECURITY_LABEL"),
    (0x001F, "OBSOLETED_IPMS"),
    (0x0020, "ORIGINALLY_INTENDED_RECIPIENT_NAME"),
    (0x0021, "ORIGINAL_EITS"),
    (0x0022, "ORIGINATOR_CERTIFICATE"),
    (0x0023, "ORIGINATOR_DELIVERY_REPORT_REQUESTED"),
    (0x0024, "ORIGINATOR_RETURN_ADDRESS"),
    (0x0025, "PARENT_KEY"),
    (0x0026, "PRIORITY"),
    (0x0027, "ORIGIN_CHECK"),
    (0x0028, "PROOF_OF_SUBMISSION_REQUESTED"),
    (0x0029, "READ_RECEIPT_REQUESTED"),
    (0x002A, "RECEIPT_TIME"),
    (0x002B, "RECIPIENT_REASSIGNMENT_PROHIBITED"),
    (0x002C, "REDIRECTION_HISTORY"),
    (0x002D, "RELATED_IPMS"),
    (0x002E, "ORIGINAL_SENSITIVITY"),
    (0x002F, "LANGUAGES"),
    (0x0030, "REPLY_TIME"),
    (0x0031, "REPORT_TAG"),
    (0x0032, "REPORT_TIME"),
    (0x0033, "RETURNED_IPM"),
    (0x0034, "SECURITY"),
    (0x0035, "INCOMPLETE_COPY"),
    (0x0036, "SENSITIVITY"),
    (0x0037, "SUBJECT"),
    (0x0038, "SUBJECT_IPM"),
    (0x0039, "CLIENT_SUBMIT_TIME"),
    (0x003A, "REPORT_NAME"),
    (0x003B, "SENT_REPRESENTING_SEARCH_KEY"),
    (0x003C, "X400_CONTENT_TYPE"),
    (0x003D, "SUBJECT_PREFIX"),
    (0x003E, "NON_RECEIPT_REASON"),
    (0x003F, "RECEIVED_BY_ENTRYID"),
    (0x0040, "RECEIVED_BY_NAME"),
    (0x0041, "SENT_REPRESENTING_ENTRYID"),
    (0x0042, "SENT_REPRESENTING_NAME"),
    (0x0043, "RCVD_REPRESENTING_ENTRYID"),
    (0x0044, "RCVD_REPRESENTING_NAME"),
    (0x0045, "REPORT_ENTRYID"),
    (0x0046, "READ_RECEIPT_ENTRYID"),
    (0x0047, "MESSAGE_SUBMISSION_ID"),
    (0x0048, "PROVIDER_SUBMIT_TIME"),
    (0x0049, "ORIGINAL_SUBJECT"),
    (0x004A, "DISC_VAL"),
    (0x004B, "ORIG_MESSAGE_CLASS"),
    (0x004C, "ORIGINAL_AUTHOR_ENTRYID"),
    (0x004D, "ORIGINAL_AUTHOR_NAME"),
    (0x004E, "ORIGINAL_SUBMIT_TIME"),
    (0x004F, "REPLY_RECIPIENT_ENTRIES"),
    (0x0050, "REPLY_RECIPIENT_NAMES"),
    (0x0051, "RECEIVED_BY_SEARCH_KEY"),
    (0x0052, "RCVD_REPRESENTING_SEARCH_KEY"),
    (0x0053, "READ_RECEIPT_SEARCH_KEY"),
    (0x0054, "REPORT_SEARCH_KEY"),
    (0x0055, "ORIGINAL_DELIVERY_TIME"),
    (0x0056, "ORIGINAL_AUTHOR_SEARCH_KEY"),
    (0x0057, "MESSAGE_TO_ME"),
    (0x0058, "MESSAGE_CC_ME"),
    (0x0059, "MESSAGE_RECIP_ME"),
    (0x005A, "ORIGINAL_SENDER_NAME"),
    (0x005B, "ORIGINAL_SENDER_ENTRYID"),
    (0x005C, "ORIGINAL_SENDER_SEARCH_KEY"),
    (0x005D, "ORIGINAL_SENT_REPRESENTING_NAME"),
    (0x005E, "ORIGINAL_SENT_REPRESENTING_ENTRYID"),
    (0x005F, "ORIGINAL_SENT_REPRESENTING_SEARCH_KEY"),
    (0x0060, "START_DATE"),
    (0x0061, "END_DATE"),
    (0x0062, "OWNER_APPT_ID"),
    (0x0063, "RESPONSE_REQUESTED"),
    (0x0064, "SENT_REPRESENTING_ADDRTYPE"),
    (0x0065, "SENT_REPRESENTING_EMAIL_ADDRESS"),
    (0x0066, "ORIGINAL_SENDER_ADDRTYPE"),
    (0x0067, "ORIGINAL_SENDER_EMAIL_ADDRESS"),
    (0x0068, "ORIGINAL_SENT_REPRESENTING_ADDRTYPE"),
    (0x0069, "ORIGINAL_SENT_REPRESENTING_EMAIL_ADDRESS"),
    (0x0070, "CONVERSATION_TOPIC"),
    (0x0071, "CONVERSATION_INDEX"),
    (0x0072, "ORIGINAL_DISPLAY_BCC"),
    (0x0073, "ORIGINAL_DISPLAY_CC"),
    (0x0074, "ORIGINAL_DISPLAY_TO"),
    (0x0075, "RECEIVED_BY_ADDRTYPE"),
    (0x0076, "RECEIVED_BY_EMAIL_ADDRESS"),
    (0x0077, "RCVD_REPRESENTING_ADDRTYPE"),
    (0x0078, "RCVD_REPRESENTING_EMAIL_ADDRESS"),
    (0x0079, "ORIGINAL_AUTHOR_ADDRTYPE"),
    (0x007A, "ORIGINAL_AUTHOR_EMAIL_ADDRESS"),
    (0x007B, "ORIGINALLY_INTENDED_RECIP_ADDRTYPE"),
    (0x007C, "ORIGINALLY_INTENDED_RECIP_EMAIL_ADDRESS"),
    (0x007D, "TRANSPORT_MESSAGE_HEADERS"),
    (0x007E, "DELEGATION"),
    (0x007F, "TNEF_CORRELATION_KEY"),
    (0x0C00, "CONTENT_INTEGRITY_CHECK"),
    (0x0C01, "EXPLICIT_CONVERSION"),
    (0x0C02, "IPM_RETURN_REQUESTED"),
    (0x0C03, "MESSAGE_TOKEN"),
    (0x0C04, "NDR_REASON_CODE"),
    (0x0C05, "NDR_DIAG_CODE"),
    (0x0C06, "NON_RECEIPT_NOTIFICATION_REQUESTED"),
    (0x0C07, "DELIVERY_POINT"),
    (0x0C08, "ORIGINATOR_NON_DELIVERY_REPORT_REQUESTED"),
    (0x0C09, "ORIGINATOR_REQUESTED_ALTERNATE_RECIPIENT"),
    (0x0C0A, "PHYSICAL_DELIVERY_BUREAU_FAX_DELIVERY"),
    (0x0C0B, "PHYSICAL_DELIVERY_MODE"),
    (0x0C0C, "PHYSICAL_DELIVERY_REPORT_REQUEST"),
    (0x0C0D, "PHYSICAL_FORWARDING_ADDRESS"),
    (0x0C0E, "PHYSICAL_FORWARDING_ADDRESS_REQUESTED"),
    (0x0C0F, "PHYSICAL_FORWARDING_PROHIBITED"),
    (0x0C10, "PHYSICAL_RENDITION_ATTRIBUTES"),
    (0x0C11, "PROOF_OF_DELIVERY"),
    (0x0C12, "PROOF_OF_DELIVERY_REQUESTED"),
    (0x0C13, "RECIPIENT_CERTIFICATE"),
    (0x0C14, "RECIPIENT_NUMBER_FOR_ADVICE"),
    (0x0C15, "RECIPIENT_TYPE"),
    (0x0C16, "REGISTERED_MAIL_TYPE"),
    (0x0C17, "REPLY_REQUESTED"),
    (0x0C18, "REQUESTED_DELIVERY_METHOD"),
    (0x0C19, "SENDER_ENTRYID"),
    (0x0C1A, "SENDER_NAME"),
    (0x0C1B, "SUPPLEMENTARY_INFO"),
    (0x0C1C, "TYPE_OF_MTS_USER"),
    (0x0C1D, "SENDER_SEARCH_KEY"),
    (0x0C1E, "SENDER_ADDRTYPE"),
    (0x0C1F, "SENDER_EMAIL_ADDRESS"),
    (0x0E00, "CURRENT_VERSION"),
    (0x0E01, "DELETE_AFTER_SUBMIT"),
    (0x0E02, "DISPLAY_BCC"),
    (0x0E03, "DISPLAY_CC"),
    (0x0E04, "DISPLAY_TO"),
    (0x0E05, "PARENT_DISPLAY"),
    (0x0E06, "MESSAGE_DELIVERY_TIME"),
    (0x0E07, "MESSAGE_FLAGS"),
    (0x0E08, "MESSAGE_SIZE"),
    (0x0E09, "PARENT_ENTRYID"),
    (0x0E0A, "SENTMAIL_ENTRYID"),
    (0x0E0C, "CORRELATE"),
    (0x0E0D, "CORRELATE_MTSID"),
    (0x0E0E, "DISCRETE_VALUES"),
    (0x0E0F, "RESPONSIBILITY"),
    (0x0E10, "SPOOLER_STATUS"),
    (0x0E11, "TRANSPORT_STATUS"),
    (0x0E12, "MESSAGE_RECIPIENTS"),
    (0x0E13, "MESSAGE_ATTACHMENTS"),
    (0x0E14, "SUBMIT_FLAGS"),
    (0x0E15, "RECIPIENT_STATUS"),
    (0x0E16, "TRANSPORT_KEY"),
    (0x0E17, "MSG_STATUS"),
    (0x0E18, "MESSAGE_DOWNLOAD_TIME"),
    (0x0E19, "CREATION_VERSION"),
    (0x0E1A, "MODIFY_VERSION"),
    (0x0E1B, "HASATTACH"),
    (0x0E1D, "NORMALIZED_SUBJECT"),
    (0x0E1F, "RTF_IN_SYNC"),
    (0x0E20, "ATTACH_SIZE"),
    (0x0E21, "ATTACH_NUM"),
    (0x0E22, "PREPROCESS"),
    (0x0E25, "ORIGINATING_MTA_CERTIFICATE"),
    (0x0E26, "PROOF_OF_SUBMISSION"),
    (0x0FF4, "ACCESS"),
    (0x0FF5, "ROW_TYPE"),
    (0x0FF6, "INSTANCE_KEY"),
    (0x0FF7, "ACCESS_LEVEL"),
    (0x0FF8, "MAPPING_SIGNATURE"),
    (0x0FF9, "RECORD_KEY"),
    (0x0FFA, "STORE_RECORD_KEY"),
    (0x0FFB, "STORE_ENTRYID"),
    (0x0FFC, "MINI_ICON"),
    (0x0FFD, "ICON"),
    (0x0FFE, "OBJECT_TYPE"),
    (0x0FFF, "ENTRYID"),
    (0x1000, "BODY"),
    (0x1001, "REPORT_TEXT"),
    (0x1002, "ORIGINATOR_AND_DL_EXPANSION_HISTORY"),
    (0x1003, "REPORTING_DL_NAME"),
    (0x1004, "REPORTING_MTA_CERTIFICATE"),
    (0x1006, "RTF_SYNC_BODY_CRC"),
    (0x1007, "RTF_SYNC_BODY_COUNT"),
    (0x1008, "RTF_SYNC_BODY_TAG"),
    (0x1009, "RTF_COMPRESSED"),
    (0x1010, "RTF_SYNC_PREFIX_COUNT"),
    (0x1011, "RTF_SYNC_TRAILING_COUNT"),
    (0x1012, "ORIGINALLY_INTENDED_RECIP_ENTRYID"),
    (0x3000, "ROWID"),
    (0x3001, "DISPLAY_NAME"),
    (0x3002, "ADDRTYPE"),
    (0x3003, "EMAIL_ADDRESS"),
    (0x3004, "COMMENT"),
    (0x3005, "DEPTH"),
    (0x3006, "PROVIDER_DISPLAY"),
    (0x3007, "CREATION_TIME"),
    (0x3008, "LAST_MODIFICATION_TIME"),
    (0x3009, "RESOURCE_FLAGS"),
    (0x300A, "PROVIDER_DLL_NAME"),
    (0x300B, "SEARCH_KEY"),
    (0x300C, "PROVIDER_UID"),
    (0x300D, "PROVIDER_ORDINAL"),
    (0x3301, "FORM_VERSION"),
    (0x3302, "FORM_CLSID"),
    (0x3303, "FORM_CONTACT_NAME"),
    (0x3304, "FORM_CATEGORY"),
    (0x3305, "FORM_CATEGORY_SUB"),
    (0x3306, "FORM_HOST_MAP"),
    (0x3307, "FORM_HIDDEN"),
    (0x3308, "FORM_DESIGNER_NAME"),
    (0x3309, "FORM_DESIGNER_GUID"),
    (0x330A, "FORM_MESSAGE_BEHAVIOR"),
    (0x3400, "DEFAULT_STORE"),
    (0x340D, "STORE_SUPPORT_MASK"),
    (0x340E, "STORE_STATE"),
    (0x3410, "IPM_SUBTREE_SEARCH_KEY"),
    (0x3411, "IPM_OUTBOX_SEARCH_KEY"),
    (0x3412, "IPM_WASTEBASKET_SEARCH_KEY"),
    (0x3413, "IPM_SENTMAIL_SEARCH_KEY"),
    (0x3414, "MDB_PROVIDER"),
    (0x3415, "RECEIVE_FOLDER_SETTINGS"),
    (0x35DF, "VALID_FOLDER_MASK"),
    (0x35E0, "IPM_SUBTREE_ENTRYID"),
    (0x35E2, "IPM_OUTBOX_ENTRYID"),
    (0x35E3, "IPM_WASTEBASKET_ENTRYID"),
    (0x35E4, "IPM_SENTMAIL_ENTRYID"),
    (0x35E5, "VIEWS_ENTRYID"),
    (0x35E6, "COMMON_VIEWS_ENTRYID"),
    (0x35E7, "FINDER_ENTRYID"),
    (0x3600, "CONTAINER_FLAGS"),
    (0x3601, "FOLDER_TYPE"),
    (0x3602, "CONTENT_COUNT"),
    (0x3603, "CONTENT_UNREAD"),
    (0x3604, "CREATE_TEMPLATES"),
    (0x3605, "DETAILS_TABLE"),
    (0x3607, "SEARCH"),
    (0x3609, "SELECTABLE"),
    (0x360A, "SUBFOLDERS"),
    (0x360B, "STATUS"),
    (0x360C, "ANR"),
    (0x360D, "CONTENTS_SORT_ORDER"),
    (0x360E, "CONTAINER_HIERARCHY"),
    (0x360F, "CONTAINER_CONTENTS"),
    (0x3610, "FOLDER_ASSOCIATED_CONTENTS"),
    (0x3611, "DEF_CREATE_DL"),
    (0x3612, "DEF_CREATE_MAILUSER"),
    (0x3613, "CONTAINER_CLASS"),
    (0x3614, "CONTAINER_MODIFY_VERSION"),
    (0x3615, "AB_PROVIDER_ID"),
    (0x3616, "DEFAULT_VIEW_ENTRYID"),
    (0x3617, "ASSOC_CONTENT_COUNT"),
    (0x3700, "ATTACHMENT_X400_PARAMETERS"),
    (0x3701, "ATTACH_DATA_BIN"),
    (0x3702, "ATTACH_ENCODING"),
    (0x3703, "ATTACH_EXTENSION"),
    (0x3704, "ATTACH_FILENAME"),
    (0x3705, "ATTACH_METHOD"),
    (0x3707, "ATTACH_LONG_FILENAME"),
    (0x3708, "ATTACH_PATHNAME"),
    (0x370A, "ATTACH_TAG"),
    (0x370B, "RENDERING_POSITION"),
    (0x370C, "ATTACH_TRANSPORT_NAME"),
    (0x370D, "ATTACH_LONG_PATHNAME"),
    (0x370E, "ATTACH_MIME_TAG"),
    (0x370F, "ATTACH_ADDITIONAL_INFO"),
    (0x3900, "DISPLAY_TYPE"),
    (0x3902, "TEMPLATEID"),
    (0x3904, "PRIMARY_CAPABILITY"),
    (0x39FF, "7BIT_DISPLAY_NAME"),
    (0x3A00, "ACCOUNT"),
    (0x3A01, "ALTERNATE_RECIPIENT"),
    (0x3A02, "CALLBACK_TELEPHONE_NUMBER"),
    (0x3A03, "CONVERSION_PROHIBITED"),
    (0x3A04, "DISCLOSE_RECIPIENTS"),
    (0x3A05, "GENERATION"),
    (0x3A06, "GIVEN_NAME"),
    (0x3A07, "GOVERNMENT_ID_NUMBER"),
    (0x3A08, "BUSINESS_TELEPHONE_NUMBER"),
    (0x3A09, "HOME_TELEPHONE_NUMBER"),
    (0x3A0A, "INITIALS"),
    (0x3A0B, "KEYWORD"),
    (0x3A0C, "LANGUAGE"),
    (0x3A0D, "LOCATION"),
    (0x3A0E, "MAIL_PERMISSION"),
    (0x3A0F, "MHS_COMMON_NAME"),
    (0x3A10, "ORGANIZATIONAL_ID_NUMBER"),
    (0x3A11, "SURNAME"),
    (0x3A12, "ORIGINAL_ENTRYID"),
    (0x3A13, "ORIGINAL_DISPLAY_NAME"),
    (0x3A14, "ORIGINAL_SEARCH_KEY"),
    (0x3A15, "POSTAL_ADDRESS"),
    (0x3A16, "COMPANY_NAME"),
    (0x3A17, "TITLE"),
    (0x3A18, "DEPARTMENT_NAME"),
    (0x3A19, "OFFICE_LOCATION"),
    (0x3A1A, "PRIMARY_TELEPHONE_NUMBER"),
    (0x3A1B, "BUSINESS2_TELEPHONE_NUMBER"),
    (0x3A1C, "MOBILE_TELEPHONE_NUMBER"),
    (0x3A1D, "RADIO_TELEPHONE_NUMBER"),
    (0x3A1E, "CAR_TELEPHONE_NUMBER"),
    (0x3A1F, "OTHER_TELEPHONE_NUMBER"),
    (0x3A20, "TRANSMITABLE_DISPLAY_NAME"),
    (0x3A21, "PAGER_TELEPHONE_NUMBER"),
    (0x3A22, "USER_CERTIFICATE"),
    (0x3A23, "PRIMARY_FAX_NUMBER"),
    (0x3A24, "BUSINESS_FAX_NUMBER"),
    (0x3A25, "HOME_FAX_NUMBER"),
    (0x3A26, "COUNTRY"),
    (0x3A27, "LOCALITY"),
    (0x3A28, "STATE_OR_PROVINCE"),
    (0x3A29, "STREET_ADDRESS"),
    (0x3A2A, "POSTAL_CODE"),
    (0x3A2B, "POST_OFFICE_BOX"),
    (0x3A2C, "TELEX_NUMBER"),
    (0x3A2D, "ISDN_NUMBER"),
    (0x3A2E, "ASSISTANT_TELEPHONE_NUMBER"),
    (0x3A2F, "HOME2_TELEPHONE_NUMBER"),
    (0x3A30, "ASSISTANT"),
    (0x3A40, "SEND_RICH_INFO"),
    (0x3A41, "WEDDING_ANNIVERSARY"),
    (0x3A42, "BIRTHDAY"),
    (0x3A43, "HOBBIES"),
    (0x3A44, "MIDDLE_NAME"),
    (0x3A45, "DISPLAY_NAME_PREFIX"),
    (0x3A46, "PROFESSION"),
    (0x3A47, "PREFERRED_BY_NAME"),
    (0x3A48, "SPOUSE_NAME"),
    (0x3A49, "COMPUTER_NETWORK_NAME"),
    (0x3A4A, "CUSTOMER_ID"),
    (0x3A4B, "TTYTDD_PHONE_NUMBER"),
    (0x3A4C, "FTP_SITE"),
    (0x3A4D, "GENDER"),
    (0x3A4E, "MANAGER_NAME"),
    (0x3A4F, "NICKNAME"),
    (0x3A50, "PERSONAL_HOME_PAGE"),
    (0x3A51, "BUSINESS_HOME_PAGE"),
    (0x3A52, "CONTACT_VERSION"),
    (0x3A53, "CONTACT_ENTRYIDS"),
    (0x3A54, "CONTACT_ADDRTYPES"),
    (0x3A55, "CONTACT_DEFAULT_ADDRESS_INDEX"),
    (0x3A56, "CONTACT_EMAIL_ADDRESSES"),
    (0x3A57, "COMPANY_MAIN_PHONE_NUMBER"),
    (0x3A58, "CHILDRENS_NAMES"),
    (0x3A59, "HOME_ADDRESS_CITY"),
    (0x3A5A, "HOME_ADDRESS_COUNTRY"),
    (0x3A5B, "HOME_ADDRESS_POSTAL_CODE"),
    (0x3A5C, "HOME_ADDRESS_STATE_OR_PROVINCE"),
    (0x3A5D, "HOME_ADDRESS_STREET"),
    (0x3A5E, "HOME_ADDRESS_POST_OFFICE_BOX"),
    (0x3A5F, "OTHER_ADDRESS_CITY"),
    (0x3A60, "OTHER_ADDRESS_COUNTRY"),
    (0x3A61, "OTHER_ADDRESS_POSTAL_CODE"),
    (0x3A62, "OTHER_ADDRESS_STATE_OR_PROVINCE"),
    (0x3A63, "OTHER_ADDRESS_STREET"),
    (0x3A64, "OTHER_ADDRESS_POST_OFFICE_BOX"),
    (0x3D00, "STORE_PROVIDERS"),
    (0x3D01, "AB_PROVIDERS"),
    (0x3D02, "TRANSPORT_PROVIDERS"),
    (0x3D04, "DEFAULT_PROFILE"),
    (0x3D05, "AB_SEARCH_PATH"),
    (0x3D06, "AB_DEFAULT_DIR"),
    (0x3D07, "AB_DEFAULT_PAB"),
    (0x3D09, "SERVICE_NAME"),
    (0x3D0A, "SERVICE_DLL_NAME"),
    (0x3D0B, "SERVICE_entryName"),
    (0x3D0C, "SERVICE_UID"),
    (0x3D0D, "SERVICE_EXTRA_UIDS"),
    (0x3D0E, "SERVICES"),
    (0x3D0F, "SERVICE_SUPPORT_FILES"),
    (0x3D10, "SERVICE_DELETE_FILES"),
    (0x3D11, "AB_SEARCH_PATH_UPDATE"),
    (0x3D12, "PROFILE_NAME"),
    (0x3E00, "IDENTITY_DISPLAY"),
    (0x3E01, "IDENTITY_ENTRYID"),
    (0x3E02, "RESOURCE_METHODS"),
    (0x3E03, "RESOURCE_TYPE"),
    (0x3E04, "STATUS_CODE"),
    (0x3E05, "IDENTITY_SEARCH_KEY"),
    (0x3E06, "OWN_STORE_ENTRYID"),
    (0x3E07, "RESOURCE_PATH"),
    (0x3E08, "STATUS_STRING"),
    (0x3E09, "X400_DEFERRED_DELIVERY_CANCEL"),
    (0x3E0A, "HEADER_FOLDER_ENTRYID"),
    (0x3E0B, "REMOTE_PROGRESS"),
    (0x3E0C, "REMOTE_PROGRESS_TEXT"),
    (0x3E0D, "REMOTE_VALIDATE_OK"),
    (0x3F00, "CONTROL_FLAGS"),
    (0x3F01, "CONTROL_STRUCTURE"),
    (0x3F02, "CONTROL_TYPE"),
    (0x3F03, "DELTAX"),
    (0x3F04, "DELTAY"),
    (0x3F05, "XPOS"),
    (0x3F06, "YPOS"),
    (0x3F07, "CONTROL_ID"),
    (0x3F08, "INITIAL_DETAILS_PANE"),
];
