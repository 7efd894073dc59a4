//! Domain operations on top of [`ApiClient::request`]
//!
//! Login, signup, refresh and logout are public calls: they are how a
//! session is obtained, so they never carry a bearer token. Everything else
//! requires the session.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::{IMAGE_UPLOAD_PATH, LOGIN_PATH, LOGOUT_PATH, ME_PATH, SIGNUP_PATH};
use crate::error::ApiResult;
use crate::models::{
    AuthResponse, ImageUpload, LoginRequest, ProfileUpdate, RefreshRequest, SignupRequest,
    TokenPair, UploadedImage, User,
};
use crate::network::{ApiClient, RequestDescriptor};

impl ApiClient {
    /// Sign in and hold the issued token pair
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let descriptor = RequestDescriptor::post(LOGIN_PATH).json(&body)?.public();
        let response: AuthResponse = self.request(descriptor).await?;
        self.session().rotate(&response.tokens);
        tracing::info!(user_id = %response.user.id, "Signed in");
        Ok(response)
    }

    /// Create an account and hold the issued token pair
    pub async fn signup(&self, signup: &SignupRequest) -> ApiResult<AuthResponse> {
        let descriptor = RequestDescriptor::post(SIGNUP_PATH).json(signup)?.public();
        let response: AuthResponse = self.request(descriptor).await?;
        self.session().rotate(&response.tokens);
        tracing::info!(user_id = %response.user.id, "Account created");
        Ok(response)
    }

    /// Exchange the held refresh token for a new pair.
    ///
    /// Shares any refresh already in flight. On success the pair is rotated
    /// and the token-refresh listener is notified; on failure the auth-error
    /// listener is.
    pub async fn refresh_access_token(&self) -> ApiResult<TokenPair> {
        self.refresh_now().await
    }

    /// Revoke the refresh token server-side and drop the held pair
    pub async fn logout(&self) -> ApiResult<()> {
        let credentials = self.get_tokens();
        if let Some(refresh_token) = credentials.refresh_token.as_deref() {
            let descriptor = RequestDescriptor::post(LOGOUT_PATH)
                .json(&RefreshRequest { refresh_token })?
                .public();
            self.request::<()>(descriptor).await?;
        }
        self.session().clear();
        tracing::info!("Signed out");
        Ok(())
    }

    pub async fn get_current_user(&self) -> ApiResult<User> {
        self.request(RequestDescriptor::get(ME_PATH)).await
    }

    pub async fn update_password(&self, current_password: &str, new_password: &str) -> ApiResult<User> {
        let update = ProfileUpdate {
            current_password: Some(current_password.to_string()),
            new_password: Some(new_password.to_string()),
            ..Default::default()
        };
        self.update_profile(&update).await
    }

    pub async fn update_avatar_url(&self, avatar_url: &str) -> ApiResult<User> {
        let update = ProfileUpdate {
            avatar_url: Some(avatar_url.to_string()),
            ..Default::default()
        };
        self.update_profile(&update).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<User> {
        self.request(RequestDescriptor::patch(ME_PATH).json(update)?)
            .await
    }

    /// Upload image bytes; returns where the server stored them
    pub async fn upload_image(
        &self,
        bytes: &[u8],
        content_type: &str,
        file_name: Option<&str>,
    ) -> ApiResult<UploadedImage> {
        let upload = ImageUpload {
            image: data_uri(bytes, content_type),
            file_name: file_name.map(str::to_string),
        };
        tracing::debug!(size = bytes.len(), content_type, "Uploading image");
        self.request(RequestDescriptor::post(IMAGE_UPLOAD_PATH).json(&upload)?)
            .await
    }
}

fn data_uri(bytes: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}
