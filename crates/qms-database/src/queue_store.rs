//! 队列存储的PostgreSQL实现
//!
//! 计数器变更用行锁加条件更新保证原子性，审计行与计数器
//! 在同一事务内提交。守卫未命中（停诊、计数为零、诊所不存在）
//! 统一返回 `Ok(None)`。

use crate::models::{DbClinic, DbQueueCall};
use async_trait::async_trait;
use qms_core::{CallStatus, Clinic, QmsError, QueueCall, Result};
use qms_queue::{NewQueueCall, QueueMutation, QueueStore};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// PostgreSQL队列存储
#[derive(Clone)]
pub struct PgQueueStore {
    pool: PgPool,
}

impl PgQueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 锁定诊所行，事务结束前其他计数器变更会阻塞
    async fn lock_clinic(
        tx: &mut Transaction<'static, Postgres>,
        clinic_id: Uuid,
    ) -> Result<Option<Clinic>> {
        let row = sqlx::query_as::<_, DbClinic>(
            "SELECT * FROM clinics WHERE id = $1 FOR UPDATE"
        )
        .bind(clinic_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(row.map(Clinic::from))
    }

    async fn insert_call(
        tx: &mut Transaction<'static, Postgres>,
        call: &NewQueueCall,
    ) -> Result<QueueCall> {
        let row = sqlx::query_as::<_, DbQueueCall>(r#"
            INSERT INTO queue_calls (id, clinic_id, patient_number, is_emergency,
                transferred_to_clinic_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        "#)
        .bind(Uuid::new_v4())
        .bind(call.clinic_id)
        .bind(call.patient_number)
        .bind(call.is_emergency)
        .bind(call.transferred_to_clinic_id)
        .bind(call.status.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(QueueCall::from(row))
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> Result<()> {
        tx.commit()
            .await
            .map_err(|e| QmsError::Database(e.to_string()))
    }
}

#[async_trait]
impl QueueStore for PgQueueStore {
    async fn fetch_clinic(&self, clinic_id: Uuid) -> Result<Option<Clinic>> {
        let row = sqlx::query_as::<_, DbClinic>("SELECT * FROM clinics WHERE id = $1")
            .bind(clinic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(row.map(Clinic::from))
    }

    async fn advance(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
        let mut tx = self.begin().await?;

        let Some(before) = Self::lock_clinic(&mut tx, clinic_id).await? else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, DbClinic>(r#"
            UPDATE clinics
            SET current_number = current_number + 1, last_call_time = NOW(), updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
        "#)
        .bind(clinic_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        let Some(after) = updated.map(Clinic::from) else {
            return Ok(None);
        };

        let call = Self::insert_call(
            &mut tx,
            &NewQueueCall::called(clinic_id, after.current_number),
        )
        .await?;
        Self::commit(tx).await?;

        Ok(Some(QueueMutation {
            before,
            after,
            call: Some(call),
        }))
    }

    async fn recede(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
        let mut tx = self.begin().await?;

        let Some(before) = Self::lock_clinic(&mut tx, clinic_id).await? else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, DbClinic>(r#"
            UPDATE clinics
            SET current_number = current_number - 1, updated_at = NOW()
            WHERE id = $1 AND current_number > 0
            RETURNING *
        "#)
        .bind(clinic_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        let Some(after) = updated.map(Clinic::from) else {
            return Ok(None);
        };

        Self::commit(tx).await?;

        Ok(Some(QueueMutation {
            before,
            after,
            call: None,
        }))
    }

    async fn set_current(&self, clinic_id: Uuid, number: i32) -> Result<Option<QueueMutation>> {
        let mut tx = self.begin().await?;

        let Some(before) = Self::lock_clinic(&mut tx, clinic_id).await? else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, DbClinic>(r#"
            UPDATE clinics
            SET current_number = $2, last_call_time = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#)
        .bind(clinic_id)
        .bind(number)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        let after = Clinic::from(updated);
        let call = Self::insert_call(&mut tx, &NewQueueCall::called(clinic_id, number)).await?;
        Self::commit(tx).await?;

        Ok(Some(QueueMutation {
            before,
            after,
            call: Some(call),
        }))
    }

    async fn reset(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
        let mut tx = self.begin().await?;

        let Some(before) = Self::lock_clinic(&mut tx, clinic_id).await? else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, DbClinic>(r#"
            UPDATE clinics
            SET current_number = 0, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#)
        .bind(clinic_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        let after = Clinic::from(updated);
        Self::commit(tx).await?;

        Ok(Some(QueueMutation {
            before,
            after,
            call: None,
        }))
    }

    async fn set_active(&self, clinic_id: Uuid, active: bool) -> Result<Option<Clinic>> {
        let updated = sqlx::query_as::<_, DbClinic>(r#"
            UPDATE clinics
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#)
        .bind(clinic_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(updated.map(Clinic::from))
    }

    async fn append_call(&self, call: NewQueueCall) -> Result<QueueCall> {
        let mut tx = self.begin().await?;
        let inserted = Self::insert_call(&mut tx, &call).await?;
        Self::commit(tx).await?;
        Ok(inserted)
    }

    async fn fetch_call(&self, call_id: Uuid) -> Result<Option<QueueCall>> {
        let row = sqlx::query_as::<_, DbQueueCall>("SELECT * FROM queue_calls WHERE id = $1")
            .bind(call_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(row.map(QueueCall::from))
    }

    async fn update_call_status(
        &self,
        call_id: Uuid,
        status: CallStatus,
    ) -> Result<Option<QueueCall>> {
        let row = sqlx::query_as::<_, DbQueueCall>(r#"
            UPDATE queue_calls
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        "#)
        .bind(call_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(row.map(QueueCall::from))
    }

    async fn list_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<QueueCall>> {
        let rows = sqlx::query_as::<_, DbQueueCall>(r#"
            SELECT * FROM queue_calls
            WHERE clinic_id = $1
            ORDER BY called_at DESC
            LIMIT $2
        "#)
        .bind(clinic_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(QueueCall::from).collect())
    }
}
