use serde::Deserialize;

use crate::users::repo_types::ProfilePatch;

/// Body of `PUT /api/user/profile`. Absent or blank fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(r: UpdateProfileRequest) -> Self {
        use crate::auth::services::non_blank;
        Self {
            first_name: non_blank(r.first_name),
            last_name: non_blank(r.last_name),
            email: non_blank(r.email),
            phone: non_blank(r.phone),
            bio: non_blank(r.bio),
        }
    }
}
