use reqwest::Client;
use stargazer::dto::{
    CreateBoardMemberDto, CreateDonationDto, CreateEventDto, EventQueryDto, IssueBadgeDto,
    ListingQueryDto, LoginDto, MemberQueryDto, PaymentQueryDto, QuoteRequestDto, RefundDto,
    RegisterDto, UpdateEventDto, UpdateMemberDto,
};
use stargazer::models::{Badge, BoardMember, Event, Listing, Payment, User};

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// HTTP client wrapper for communicating with the Stargazer server
pub struct StargazerClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// Session token, when the caller is logged in
    token: Option<String>,
    /// The underlying HTTP client
    client: Client,
}

impl StargazerClient {
    /// Creates a new StargazerClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the Stargazer server
    /// * `token` - A session token, for the endpoints that need one
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url,
            token,
            client: Client::new(),
        }
    }

    /// Attaches the bearer token to a request when one is set
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ── Auth endpoints ───────────────────────────────────────────────

    /// Registers a new member account and returns the session envelope
    pub async fn register(&self, dto: &RegisterDto) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api/auth/register", self.base_url);
        let response = self.client.post(&url).json(dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Logs in and returns the session envelope (token plus account)
    pub async fn login(&self, dto: &LoginDto) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self.client.post(&url).json(dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Revokes the current session token
    pub async fn logout(&self) -> Result<(), ClientError> {
        let url = format!("{}/api/auth/logout", self.base_url);
        self.authed(self.client.post(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    /// Gets the account behind the current session token
    pub async fn me(&self) -> Result<User, ClientError> {
        let url = format!("{}/api/auth/me", self.base_url);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Member endpoints ─────────────────────────────────────────────

    /// Lists member accounts with optional filters
    pub async fn list_members(&self, query: &MemberQueryDto) -> Result<Vec<User>, ClientError> {
        let url = format!("{}/api/admin/members", self.base_url);
        let response = self.authed(self.client.get(&url).query(query))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Updates a member's role or membership expiry
    pub async fn update_member(&self, id: &str, dto: &UpdateMemberDto) -> Result<User, ClientError> {
        let url = format!("{}/api/admin/members/{}", self.base_url, id);
        let response = self.authed(self.client.patch(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deactivates a member account
    pub async fn deactivate_member(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/admin/members/{}", self.base_url, id);
        self.authed(self.client.delete(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    // ── Event endpoints ──────────────────────────────────────────────

    /// Lists events with optional filters
    pub async fn list_events(&self, query: &EventQueryDto) -> Result<Vec<Event>, ClientError> {
        let url = format!("{}/api/events", self.base_url);
        let response = self.authed(self.client.get(&url).query(query))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific event by ID
    pub async fn get_event(&self, id: &str) -> Result<Event, ClientError> {
        let url = format!("{}/api/events/{}", self.base_url, id);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Creates a new event
    pub async fn create_event(&self, dto: &CreateEventDto) -> Result<Event, ClientError> {
        let url = format!("{}/api/events", self.base_url);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Updates an event
    pub async fn update_event(&self, id: &str, dto: &UpdateEventDto) -> Result<Event, ClientError> {
        let url = format!("{}/api/events/{}", self.base_url, id);
        let response = self.authed(self.client.put(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deletes an event
    pub async fn delete_event(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/events/{}", self.base_url, id);
        self.authed(self.client.delete(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    /// Prices a star-party registration without committing to it
    pub async fn quote_event(
        &self,
        event_id: &str,
        dto: &QuoteRequestDto,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api/events/{}/quote", self.base_url, event_id);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Listing endpoints ────────────────────────────────────────────

    /// Lists classified listings with optional filters
    pub async fn list_listings(&self, query: &ListingQueryDto) -> Result<Vec<Listing>, ClientError> {
        let url = format!("{}/api/listings", self.base_url);
        let response = self.authed(self.client.get(&url).query(query))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific listing by ID
    pub async fn get_listing(&self, id: &str) -> Result<Listing, ClientError> {
        let url = format!("{}/api/listings/{}", self.base_url, id);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Payment endpoints ────────────────────────────────────────────

    /// Lists payments with optional filters
    pub async fn list_payments(&self, query: &PaymentQueryDto) -> Result<Vec<Payment>, ClientError> {
        let url = format!("{}/api/admin/payments", self.base_url);
        let response = self.authed(self.client.get(&url).query(query))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific payment by ID
    pub async fn get_payment(&self, id: &str) -> Result<Payment, ClientError> {
        let url = format!("{}/api/admin/payments/{}", self.base_url, id);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Refunds a completed payment
    pub async fn refund_payment(&self, id: &str, dto: &RefundDto) -> Result<Payment, ClientError> {
        let url = format!("{}/api/admin/payments/{}/refund", self.base_url, id);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Starts a donation checkout and returns the payment plus checkout URL
    pub async fn donate(&self, dto: &CreateDonationDto) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api/donations", self.base_url);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Board endpoints ──────────────────────────────────────────────

    /// Gets the public board roster
    pub async fn board_roster(&self) -> Result<Vec<serde_json::Value>, ClientError> {
        let url = format!("{}/api/board", self.base_url);
        let response = self.client.get(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Appoints a member to a board seat
    pub async fn appoint_board_member(
        &self,
        dto: &CreateBoardMemberDto,
    ) -> Result<BoardMember, ClientError> {
        let url = format!("{}/api/admin/board", self.base_url);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Removes a board seat from the roster
    pub async fn remove_board_member(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/admin/board/{}", self.base_url, id);
        self.authed(self.client.delete(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    // ── Badge endpoints ──────────────────────────────────────────────

    /// Gets the caller's current badge
    pub async fn my_badge(&self) -> Result<Badge, ClientError> {
        let url = format!("{}/api/user/badge", self.base_url);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Issues (or reissues) a badge for a member
    pub async fn issue_badge(&self, member_id: &str, dto: &IssueBadgeDto) -> Result<Badge, ClientError> {
        let url = format!("{}/api/admin/members/{}/badge", self.base_url, member_id);
        let response = self.authed(self.client.post(&url).json(dto))
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Lists every badge ever issued
    pub async fn list_badges(&self) -> Result<Vec<Badge>, ClientError> {
        let url = format!("{}/api/admin/badges", self.base_url);
        let response = self.authed(self.client.get(&url)).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }
}
