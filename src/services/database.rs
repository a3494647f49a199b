//! MongoDB access layer.
//!
//! One wrapper owning the client and database handle, typed collection
//! accessors, index bootstrap, and the find/save operations the handlers
//! need. Documents are saved whole (`replace_one`) after in-memory
//! mutation, matching the embedded-subdocument data model.

use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};

use crate::error::AppError;
use crate::models::{ErrorLog, Society, SuperAdmin, User, UserRole};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    /// Create the indexes the service relies on. Unique where the storage
    /// layer can enforce it; the cross-society admin email/mobile indexes
    /// are multikey lookup aids only (see DESIGN.md).
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let unique = |name: &str| {
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build()
        };
        let plain = |name: &str| IndexOptions::builder().name(name.to_string()).build();

        self.super_admins()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique("super_admin_email"))
                    .build(),
                None,
            )
            .await?;

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "phone_number": 1, "role": 1 })
                    .options(unique("user_phone_role"))
                    .build(),
                None,
            )
            .await?;

        self.societies()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "society_pin": 1 })
                    .options(unique("society_pin"))
                    .build(),
                None,
            )
            .await?;

        self.societies()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "society_admins.email": 1 })
                    .options(plain("society_admin_email"))
                    .build(),
                None,
            )
            .await?;

        self.societies()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "society_admins.mobile": 1 })
                    .options(plain("society_admin_mobile"))
                    .build(),
                None,
            )
            .await?;

        self.error_logs()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "occurred_at": 1 })
                    .options(plain("error_log_occurred_at"))
                    .build(),
                None,
            )
            .await?;

        tracing::info!("MongoDB indexes initialized");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub fn super_admins(&self) -> Collection<SuperAdmin> {
        self.db.collection("super_admins")
    }

    pub fn societies(&self) -> Collection<Society> {
        self.db.collection("societies")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn error_logs(&self) -> Collection<ErrorLog> {
        self.db.collection("error_logs")
    }

    // ==================== SuperAdmin ====================

    pub async fn find_super_admin_by_email(&self, email: &str) -> Result<Option<SuperAdmin>, AppError> {
        let email = email.trim().to_lowercase();
        Ok(self.super_admins().find_one(doc! { "email": email }, None).await?)
    }

    pub async fn find_super_admin_by_id(&self, id: &str) -> Result<Option<SuperAdmin>, AppError> {
        Ok(self.super_admins().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn insert_super_admin(&self, admin: &SuperAdmin) -> Result<(), AppError> {
        self.super_admins().insert_one(admin, None).await?;
        Ok(())
    }

    pub async fn save_super_admin(&self, admin: &SuperAdmin) -> Result<(), AppError> {
        self.super_admins()
            .replace_one(doc! { "_id": &admin.id }, admin, None)
            .await?;
        Ok(())
    }

    // ==================== Society ====================

    pub async fn insert_society(&self, society: &Society) -> Result<(), AppError> {
        self.societies().insert_one(society, None).await?;
        Ok(())
    }

    pub async fn find_all_societies(&self) -> Result<Vec<Society>, AppError> {
        let cursor = self.societies().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_society_by_pin(&self, pin: &str) -> Result<Option<Society>, AppError> {
        Ok(self
            .societies()
            .find_one(doc! { "society_pin": pin }, None)
            .await?)
    }

    pub async fn find_society_by_id(&self, id: &str) -> Result<Option<Society>, AppError> {
        Ok(self.societies().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn save_society(&self, society: &Society) -> Result<(), AppError> {
        self.societies()
            .replace_one(doc! { "_id": &society.id }, society, None)
            .await?;
        Ok(())
    }

    /// Cross-society uniqueness lookup: which society (if any) already has
    /// an admin with this email. Read-then-write; the race window is a
    /// known open issue.
    pub async fn find_society_holding_admin_email(
        &self,
        email: &str,
    ) -> Result<Option<Society>, AppError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .societies()
            .find_one(doc! { "society_admins.email": email }, None)
            .await?)
    }

    pub async fn find_society_holding_admin_mobile(
        &self,
        mobile: &str,
    ) -> Result<Option<Society>, AppError> {
        Ok(self
            .societies()
            .find_one(doc! { "society_admins.mobile": mobile }, None)
            .await?)
    }

    /// Society-admin reset redemption: matches the embedded admin on
    /// email, digest, and unexpired window in one `$elemMatch` query.
    pub async fn find_society_admin_for_reset(
        &self,
        email: &str,
        token_digest: &str,
    ) -> Result<Option<Society>, AppError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .societies()
            .find_one(
                doc! {
                    "society_admins": {
                        "$elemMatch": {
                            "email": email,
                            "reset_token_hash": token_digest,
                            "reset_token_expires_at": { "$gt": bson::DateTime::now() },
                        }
                    }
                },
                None,
            )
            .await?)
    }

    // ==================== User ====================

    pub async fn find_user_by_phone_and_role(
        &self,
        phone_number: &str,
        role: UserRole,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(
                doc! { "phone_number": phone_number, "role": role.as_str() },
                None,
            )
            .await?)
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .replace_one(doc! { "_id": &user.id }, user, None)
            .await?;
        Ok(())
    }

    // ==================== ErrorLog ====================

    pub async fn insert_error_log(&self, entry: &ErrorLog) -> Result<(), AppError> {
        self.error_logs().insert_one(entry, None).await?;
        Ok(())
    }
}
