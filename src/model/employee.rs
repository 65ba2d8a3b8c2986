use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 10,
        "name": "John Doe",
        "department": "Engineering",
        "job_title": "Backend Developer"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Owning account reference
    #[schema(example = 10)]
    pub user_id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Backend Developer", nullable = true)]
    pub job_title: Option<String>,
}
