use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    BadgeDesign, BoardMember, Conversation, Document, EventKind, LineItems, Listing,
    ListingStatus, Message, Payment, PaymentKind, PaymentStatus, Photo, Registration, User,
    UserRole, Visibility,
};

/// Data transfer object for registering a new account
///
/// This struct is used to deserialize JSON requests for registration.
#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterDto {
    /// The email address to register with
    pub email: String,

    /// The plaintext password, hashed before storage
    pub password: String,

    /// The name shown to other members
    pub name: String,
}

/// Data transfer object for logging in
///
/// This struct is used to deserialize JSON requests for login.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginDto {
    /// The email address of the account
    pub email: String,

    /// The plaintext password
    pub password: String,
}

/// Data transfer object for a successful login or registration
///
/// This struct is used to serialize the session token alongside the
/// authenticated user.
#[derive(Serialize, Debug)]
pub struct SessionResponseDto {
    /// The bearer token for subsequent requests
    pub token: String,

    /// The authenticated user
    pub user: User,
}

/// Data transfer object for creating a household member
///
/// This struct is used to deserialize JSON requests for adding family members.
#[derive(Deserialize, Debug)]
pub struct CreateFamilyMemberDto {
    /// The family member's name
    pub name: String,

    /// The year the family member was born, if given
    pub birth_year: Option<i32>,

    /// How the family member is related to the account holder
    pub relation: Option<String>,
}

/// Data transfer object for updating a household member
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateFamilyMemberDto {
    /// Optional replacement name
    pub name: Option<String>,

    /// Optional replacement birth year
    pub birth_year: Option<i32>,

    /// Optional replacement relation
    pub relation: Option<String>,
}

/// Data transfer object for creating a classifieds listing
///
/// This struct is used to deserialize JSON requests for creating listings.
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateListingDto {
    /// The listing title
    pub title: String,

    /// The full description of the item for sale
    pub description: String,

    /// The category the listing is filed under
    pub category: String,

    /// The asking price in integer cents
    pub price_cents: i64,
}

/// Data transfer object for updating a listing
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateListingDto {
    /// Optional replacement title
    pub title: Option<String>,

    /// Optional replacement description
    pub description: Option<String>,

    /// Optional replacement category
    pub category: Option<String>,

    /// Optional replacement asking price in cents
    pub price_cents: Option<i64>,
}

/// Data transfer object for filtering listings
///
/// This struct is used to deserialize query strings on the listing index.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListingQueryDto {
    /// The category to filter by
    pub category: Option<String>,

    /// The listing status to filter by
    pub status: Option<ListingStatus>,

    /// The seller to filter by
    pub seller_id: Option<String>,

    /// Free-text search over title and description
    pub q: Option<String>,
}

/// Data transfer object for attaching a photo to a listing
#[derive(Deserialize, Debug)]
pub struct AttachListingPhotoDto {
    /// The original file name, kept as a slug inside the storage key
    pub file_name: String,

    /// The MIME type the client will upload
    pub content_type: String,
}

/// Data transfer object returned when a listing photo slot is reserved
#[derive(Serialize, Debug)]
pub struct ListingPhotoResponseDto {
    /// The listing with its new photo key
    pub listing: Listing,

    /// Signed URL the client PUTs the image bytes to
    pub upload_url: String,
}

/// Data transfer object for making an offer on a listing
///
/// This struct is used to deserialize JSON requests for creating offers.
#[derive(Deserialize, Debug)]
pub struct CreateOfferDto {
    /// The offered amount in integer cents
    pub amount_cents: i64,

    /// An optional note to the seller
    pub message: Option<String>,
}

/// Data transfer object for countering an open offer
///
/// This struct is used to deserialize JSON requests for counter-offers.
#[derive(Deserialize, Debug)]
pub struct CounterOfferDto {
    /// The counter amount in integer cents
    pub amount_cents: i64,

    /// An optional note to the other party
    pub message: Option<String>,
}

/// Data transfer object for creating or updating an event
///
/// This struct is used to deserialize JSON requests for creating events.
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateEventDto {
    /// The event title
    pub title: String,

    /// The full event description
    pub description: String,

    /// What kind of event this is
    pub kind: EventKind,

    /// Where the event takes place
    pub location: String,

    /// When the event starts
    pub starts_at: DateTime<Utc>,

    /// When the event ends
    pub ends_at: DateTime<Utc>,

    /// Maximum confirmed registrations, 0 for unlimited
    #[serde(default)]
    pub capacity: i32,

    /// Cut-off for the early-bird discount, if the event has one
    pub early_bird_deadline: Option<DateTime<Utc>>,

    /// Whether the event is visible to members immediately
    #[serde(default)]
    pub published: bool,
}

/// Data transfer object for updating an event
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateEventDto {
    /// Optional replacement title
    pub title: Option<String>,

    /// Optional replacement description
    pub description: Option<String>,

    /// Optional replacement kind
    pub kind: Option<EventKind>,

    /// Optional replacement location
    pub location: Option<String>,

    /// Optional replacement start time
    pub starts_at: Option<DateTime<Utc>>,

    /// Optional replacement end time
    pub ends_at: Option<DateTime<Utc>>,

    /// Optional replacement capacity
    pub capacity: Option<i32>,

    /// Optional replacement early-bird deadline
    pub early_bird_deadline: Option<DateTime<Utc>>,

    /// Optional change to the published flag
    pub published: Option<bool>,
}

/// Data transfer object for filtering events
///
/// This struct is used to deserialize query strings on the event index.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct EventQueryDto {
    /// The event kind to filter by
    pub kind: Option<EventKind>,

    /// Whether to include events that have already ended
    pub include_past: bool,

    /// Whether to include unpublished drafts (admin only)
    pub include_unpublished: bool,
}

/// Data transfer object for a registration quote request
///
/// This struct is used both to price a quote and to create a
/// registration, since the server recomputes the price either way.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct QuoteRequestDto {
    /// Number of adults attending, including the registrant
    pub adults: i32,

    /// Number of children attending
    #[serde(default)]
    pub children: i32,

    /// Number of nights camping, 0 for day visits
    #[serde(default)]
    pub nights: i32,

    /// Whether the meal plan is included
    #[serde(default)]
    pub meal_plan: bool,
}

/// Data transfer object for a priced quote
///
/// This struct is used to serialize the itemised price breakdown.
#[derive(Serialize, Debug)]
pub struct QuoteResponseDto {
    /// The individual charges and discounts
    pub line_items: LineItems,

    /// The clamped sum of all line items in cents
    pub total_cents: i64,
}

/// Data transfer object for a created registration
///
/// This struct is used to serialize the registration together with the
/// checkout URL when payment is due.
#[derive(Serialize, Debug)]
pub struct RegistrationResponseDto {
    /// The stored registration
    pub registration: Registration,

    /// Where to pay, when the registration is confirmed and has a balance
    pub checkout_url: Option<String>,
}

/// Data transfer object for making a donation
///
/// This struct is used to deserialize JSON requests for donations.
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateDonationDto {
    /// The donation amount in integer cents
    pub amount_cents: i64,

    /// What the donation is earmarked for, if anything
    pub designation: Option<String>,

    /// An optional note from the donor
    pub note: Option<String>,
}

/// Data transfer object for a created donation
#[derive(Serialize, Debug)]
pub struct DonationResponseDto {
    /// The pending payment record
    pub payment: Payment,

    /// Where to complete the payment
    pub checkout_url: String,
}

/// Data transfer object for filtering payments in the back office
///
/// This struct is used to deserialize query strings on the admin payment index.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct PaymentQueryDto {
    /// The payment status to filter by
    pub status: Option<PaymentStatus>,

    /// The payment kind to filter by
    pub kind: Option<PaymentKind>,

    /// The paying user to filter by
    pub user_id: Option<String>,
}

/// Data transfer object for refunding a payment
///
/// This struct is used to deserialize JSON requests for refunds.
#[derive(Serialize, Deserialize, Debug)]
pub struct RefundDto {
    /// Why the payment is being refunded
    pub reason: String,
}

/// Data transfer object for payment-processor webhook events
///
/// This struct is used to deserialize the JSON body of signed webhook
/// deliveries.
#[derive(Serialize, Deserialize, Debug)]
pub struct WebhookEventDto {
    /// The event name, such as "checkout.completed"
    pub event_type: String,

    /// The processor's reference for the checkout session
    pub provider_ref: String,
}

/// Data transfer object for uploading a document
///
/// This struct is used to deserialize JSON requests for creating documents.
#[derive(Deserialize, Debug)]
pub struct CreateDocumentDto {
    /// The document title
    pub title: String,

    /// The original file name
    pub file_name: String,

    /// The MIME type of the file
    pub content_type: String,

    /// The file size in bytes, as the client intends to upload it
    #[serde(default)]
    pub size_bytes: i64,

    /// Who may download the document
    pub visibility: Visibility,
}

/// Data transfer object for a created document
///
/// This struct is used to serialize the document together with the
/// signed URL the client PUTs the file bytes to.
#[derive(Serialize, Debug)]
pub struct DocumentUploadResponseDto {
    /// The stored document record
    pub document: Document,

    /// The signed, expiring upload URL
    pub upload_url: String,
}

/// Data transfer object for a signed download link
#[derive(Serialize, Debug)]
pub struct DownloadUrlDto {
    /// The signed, expiring download URL
    pub download_url: String,
}

/// Data transfer object for uploading a gallery photo
///
/// This struct is used to deserialize JSON requests for creating photos.
#[derive(Deserialize, Debug)]
pub struct CreatePhotoDto {
    /// Title shown under the photo
    pub title: String,

    /// The original file name
    pub file_name: String,

    /// The MIME type of the file
    pub content_type: String,

    /// An optional caption
    pub caption: Option<String>,

    /// Who to credit for the photo, if not the uploader
    pub credit: Option<String>,

    /// When the photo was taken
    pub captured_at: Option<DateTime<Utc>>,
}

/// Data transfer object for a created photo
#[derive(Serialize, Debug)]
pub struct PhotoUploadResponseDto {
    /// The stored photo record
    pub photo: Photo,

    /// The signed, expiring upload URL
    pub upload_url: String,
}

/// Data transfer object for editing a photo's details
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdatePhotoDto {
    /// Optional replacement title
    pub title: Option<String>,

    /// Optional replacement caption
    pub caption: Option<String>,

    /// Optional replacement credit
    pub credit: Option<String>,

    /// Optional replacement capture time
    pub captured_at: Option<DateTime<Utc>>,

    /// Optional change to the published flag (admin only)
    pub published: Option<bool>,
}

/// Data transfer object for filtering members in the back office
///
/// This struct is used to deserialize query strings on the admin member index.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct MemberQueryDto {
    /// The role to filter by
    pub role: Option<UserRole>,

    /// Free-text search over email and display name
    pub q: Option<String>,

    /// Whether to include deactivated accounts
    pub include_deactivated: bool,
}

/// Data transfer object for updating a member in the back office
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateMemberDto {
    /// Optional replacement role
    pub role: Option<UserRole>,

    /// Optional replacement membership expiry
    pub membership_expires: Option<DateTime<Utc>>,
}

/// Data transfer object for issuing a membership badge
///
/// This struct is used to deserialize JSON requests for issuing badges.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct IssueBadgeDto {
    /// The name line to print; the member's name when omitted
    pub label: Option<String>,

    /// The badge artwork parameters, free-form JSON
    pub design: Option<BadgeDesign>,
}

/// Data transfer object for adding a board roster entry
///
/// This struct is used to deserialize JSON requests for board terms.
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateBoardMemberDto {
    /// The member holding the office
    pub user_id: String,

    /// The office held, such as "President"
    pub office: String,

    /// Position in the displayed roster, lowest first
    #[serde(default)]
    pub sort_order: i32,

    /// When the term starts
    pub term_starts: DateTime<Utc>,

    /// When the term ends
    pub term_ends: DateTime<Utc>,
}

/// Data transfer object for a board roster entry with the holder's name
#[derive(Serialize, Debug)]
pub struct BoardRosterEntryDto {
    /// The roster entry
    pub board_member: BoardMember,

    /// The name of the member holding the office
    pub name: String,
}

/// Data transfer object for starting a conversation
///
/// This struct is used to deserialize JSON requests for new conversations.
#[derive(Deserialize, Debug)]
pub struct StartConversationDto {
    /// The member to message
    pub recipient_id: String,

    /// The listing the conversation is about, if any
    pub listing_id: Option<String>,

    /// An optional subject line
    pub subject: Option<String>,

    /// The first message body
    pub body: String,
}

/// Data transfer object for sending a message
///
/// This struct is used to deserialize JSON requests for messages.
#[derive(Deserialize, Debug)]
pub struct SendMessageDto {
    /// The message body
    pub body: String,
}

/// A compact view of a user for embedding in other responses
#[derive(Serialize, Debug)]
pub struct UserSummaryDto {
    /// The user's ID
    pub id: String,

    /// The name shown to other members
    pub name: String,
}

impl From<&User> for UserSummaryDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.get_id(),
            name: user.get_name(),
        }
    }
}

/// Data transfer object for a conversation in the inbox list
///
/// This struct is used to serialize one row of the inbox, with enough
/// context to render it without further requests.
#[derive(Serialize, Debug)]
pub struct ConversationSummaryDto {
    /// The conversation itself
    pub conversation: Conversation,

    /// The other members of the conversation
    pub other_participants: Vec<UserSummaryDto>,

    /// The most recent message, if any have been sent
    pub last_message: Option<Message>,

    /// How many messages arrived after the viewer last read the thread
    pub unread_count: i64,
}

/// Data transfer object for a fully loaded conversation
#[derive(Serialize, Debug)]
pub struct ConversationDetailDto {
    /// The conversation itself
    pub conversation: Conversation,

    /// All members of the conversation
    pub participants: Vec<UserSummaryDto>,

    /// Every message in the thread, oldest first
    pub messages: Vec<Message>,
}
