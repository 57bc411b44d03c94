//! 数据库查询操作

use crate::connection::DatabasePool;
use crate::models::*;
use chrono::{NaiveDate, NaiveTime, Utc};
use qms_core::{
    AdminUser, Appointment, AppointmentStatus, AttendanceRecord, Center, Clinic, Complaint,
    ComplaintStatus, Consultation, Doctor, LeaveRequest, Notification, Patient, QmsError,
    QueueCall, RequestStatus, Result, Screen, WorkStatus,
};
use sqlx::Row;
use uuid::Uuid;

/// 数据库查询操作接口
pub struct DatabaseQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> DatabaseQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 创建中心表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS centers (
                id UUID PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                logo_url VARCHAR(512),
                address TEXT,
                phone VARCHAR(32),
                email VARCHAR(255),
                news_ticker TEXT NOT NULL DEFAULT '',
                ticker_speed INTEGER NOT NULL DEFAULT 50,
                alert_duration INTEGER NOT NULL DEFAULT 5,
                speech_speed DOUBLE PRECISION NOT NULL DEFAULT 1.0,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建显示屏表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS screens (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                screen_number INTEGER NOT NULL,
                password VARCHAR(64) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE (center_id, screen_number)
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建诊所表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS clinics (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                name VARCHAR(255) NOT NULL,
                clinic_number INTEGER NOT NULL,
                screen_ids INTEGER[] NOT NULL DEFAULT '{}',
                password VARCHAR(64) NOT NULL,
                current_number INTEGER NOT NULL DEFAULT 0 CHECK (current_number >= 0),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                last_call_time TIMESTAMP WITH TIME ZONE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建叫号记录表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS queue_calls (
                id UUID PRIMARY KEY,
                clinic_id UUID NOT NULL REFERENCES clinics(id),
                patient_number INTEGER NOT NULL,
                called_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                is_emergency BOOLEAN NOT NULL DEFAULT FALSE,
                transferred_to_clinic_id UUID REFERENCES clinics(id),
                status VARCHAR(20) NOT NULL DEFAULT 'called',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建医生表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS doctors (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                doctor_number VARCHAR(32) UNIQUE NOT NULL,
                name VARCHAR(255) NOT NULL,
                phone VARCHAR(32) NOT NULL,
                national_id VARCHAR(14) NOT NULL,
                specialty VARCHAR(255) NOT NULL,
                clinic_id UUID NOT NULL REFERENCES clinics(id),
                work_days VARCHAR(16)[] NOT NULL DEFAULT '{}',
                work_status VARCHAR(20) NOT NULL DEFAULT 'active',
                shift VARCHAR(20) NOT NULL DEFAULT 'morning',
                check_in_time TIME,
                check_out_time TIME,
                annual_leave_balance INTEGER NOT NULL DEFAULT 21,
                emergency_leave_balance INTEGER NOT NULL DEFAULT 7,
                absence_days INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                photo_url VARCHAR(512),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建患者表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                full_name VARCHAR(255) NOT NULL,
                national_id VARCHAR(14) UNIQUE NOT NULL,
                phone VARCHAR(32) NOT NULL,
                email VARCHAR(255),
                gender VARCHAR(10) NOT NULL,
                family_members INTEGER NOT NULL DEFAULT 0,
                chronic_diseases VARCHAR(255)[] NOT NULL DEFAULT '{}',
                is_pregnant BOOLEAN NOT NULL DEFAULT FALSE,
                is_breastfeeding BOOLEAN NOT NULL DEFAULT FALSE,
                previous_surgeries TEXT,
                drug_allergies TEXT,
                current_medications TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建预约表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                clinic_id UUID NOT NULL REFERENCES clinics(id),
                patient_name VARCHAR(255) NOT NULL,
                national_id VARCHAR(14) NOT NULL,
                phone VARCHAR(32) NOT NULL,
                appointment_date DATE NOT NULL,
                appointment_time TIME NOT NULL,
                visit_reason TEXT NOT NULL,
                shift VARCHAR(20) NOT NULL DEFAULT 'morning',
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建问诊表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS consultations (
                id UUID PRIMARY KEY,
                patient_id UUID NOT NULL REFERENCES patients(id),
                doctor_id UUID NOT NULL REFERENCES doctors(id),
                specialty_required VARCHAR(255) NOT NULL,
                complaint_text TEXT NOT NULL,
                current_symptoms TEXT NOT NULL,
                weight_kg DOUBLE PRECISION,
                height_cm DOUBLE PRECISION,
                blood_pressure VARCHAR(20),
                temperature DOUBLE PRECISION,
                pulse INTEGER,
                response_text TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'open',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建投诉表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS complaints (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                patient_name VARCHAR(255),
                phone VARCHAR(32),
                email VARCHAR(255),
                kind VARCHAR(20) NOT NULL DEFAULT 'complaint',
                message TEXT NOT NULL,
                notes TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'new',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建请假申请表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS leave_requests (
                id UUID PRIMARY KEY,
                doctor_id UUID NOT NULL REFERENCES doctors(id),
                request_type VARCHAR(32) NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                acting_doctor_id UUID REFERENCES doctors(id),
                notes TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建考勤表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS attendance_records (
                id UUID PRIMARY KEY,
                doctor_id UUID NOT NULL REFERENCES doctors(id),
                date DATE NOT NULL,
                check_in_time TIME,
                check_out_time TIME,
                status VARCHAR(20) NOT NULL DEFAULT 'present',
                notes TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE (doctor_id, date)
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建管理员表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id UUID PRIMARY KEY,
                center_id UUID NOT NULL REFERENCES centers(id),
                email VARCHAR(255) UNIQUE NOT NULL,
                password_hash VARCHAR(128) NOT NULL,
                full_name VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'admin',
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                last_login TIMESTAMP WITH TIME ZONE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建通知表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id UUID PRIMARY KEY,
                recipient_id UUID NOT NULL,
                recipient_type VARCHAR(20) NOT NULL,
                title VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'system',
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| QmsError::Database(e.to_string()))?;

        // 创建索引以优化查询性能
        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = vec![
            "CREATE INDEX IF NOT EXISTS idx_clinics_center_id ON clinics(center_id)",
            "CREATE INDEX IF NOT EXISTS idx_queue_calls_clinic_id ON queue_calls(clinic_id)",
            "CREATE INDEX IF NOT EXISTS idx_queue_calls_called_at ON queue_calls(called_at)",
            "CREATE INDEX IF NOT EXISTS idx_doctors_clinic_id ON doctors(clinic_id)",
            "CREATE INDEX IF NOT EXISTS idx_doctors_national_id ON doctors(national_id)",
            "CREATE INDEX IF NOT EXISTS idx_patients_national_id ON patients(national_id)",
            "CREATE INDEX IF NOT EXISTS idx_patients_phone ON patients(phone)",
            "CREATE INDEX IF NOT EXISTS idx_appointments_clinic_date ON appointments(clinic_id, appointment_date)",
            "CREATE INDEX IF NOT EXISTS idx_appointments_national_id ON appointments(national_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_doctor_id ON consultations(doctor_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_patient_id ON consultations(patient_id)",
            "CREATE INDEX IF NOT EXISTS idx_complaints_center_id ON complaints(center_id)",
            "CREATE INDEX IF NOT EXISTS idx_leave_requests_doctor_id ON leave_requests(doctor_id)",
            "CREATE INDEX IF NOT EXISTS idx_attendance_doctor_date ON attendance_records(doctor_id, date)",
            "CREATE INDEX IF NOT EXISTS idx_admin_users_email ON admin_users(email)",
            "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, recipient_type)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| QmsError::Database(e.to_string()))?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }

    // ========== 中心相关操作 ==========

    /// 读取中心配置（每个部署一条记录）
    pub async fn get_center(&self) -> Result<Option<Center>> {
        let result = sqlx::query_as::<_, DbCenter>(
            "SELECT * FROM centers ORDER BY created_at LIMIT 1"
        )
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Center::from))
    }

    /// 更新中心配置与显示屏参数
    pub async fn update_center(&self, center: &Center) -> Result<()> {
        sqlx::query(r#"
            UPDATE centers
            SET name = $2, description = $3, logo_url = $4, address = $5, phone = $6,
                email = $7, news_ticker = $8, ticker_speed = $9, alert_duration = $10,
                speech_speed = $11, updated_at = NOW()
            WHERE id = $1
        "#)
        .bind(center.id)
        .bind(&center.name)
        .bind(&center.description)
        .bind(&center.logo_url)
        .bind(&center.address)
        .bind(&center.phone)
        .bind(&center.email)
        .bind(&center.news_ticker)
        .bind(center.ticker_speed)
        .bind(center.alert_duration)
        .bind(center.speech_speed)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    /// 初始化中心记录（首次启动）
    pub async fn create_center(&self, id: Uuid, name: &str) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO centers (id, name)
            VALUES ($1, $2)
            RETURNING id
        "#)
        .bind(id)
        .bind(name)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    // ========== 显示屏相关操作 ==========

    /// 创建新显示屏
    pub async fn create_screen(&self, screen: &NewScreen) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO screens (id, center_id, screen_number, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#)
        .bind(screen.id)
        .bind(screen.center_id)
        .bind(screen.screen_number)
        .bind(&screen.password)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 列出中心的所有显示屏
    pub async fn list_screens(&self, center_id: &Uuid) -> Result<Vec<Screen>> {
        let results = sqlx::query_as::<_, DbScreen>(
            "SELECT * FROM screens WHERE center_id = $1 ORDER BY screen_number"
        )
        .bind(center_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Screen::from).collect())
    }

    /// 按屏号查找显示屏（显示屏登录）
    pub async fn get_screen_by_number(&self, screen_number: i32) -> Result<Option<Screen>> {
        let result = sqlx::query_as::<_, DbScreen>(
            "SELECT * FROM screens WHERE screen_number = $1"
        )
        .bind(screen_number)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Screen::from))
    }

    /// 删除显示屏
    pub async fn delete_screen(&self, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM screens WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 诊所相关操作 ==========

    /// 创建新诊所（计数器从零开始）
    pub async fn create_clinic(&self, clinic: &NewClinic) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO clinics (id, center_id, name, clinic_number, screen_ids, password)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#)
        .bind(clinic.id)
        .bind(clinic.center_id)
        .bind(&clinic.name)
        .bind(clinic.clinic_number)
        .bind(&clinic.screen_ids)
        .bind(&clinic.password)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 根据ID查找诊所
    pub async fn get_clinic_by_id(&self, id: &Uuid) -> Result<Option<Clinic>> {
        let result = sqlx::query_as::<_, DbClinic>(
            "SELECT * FROM clinics WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Clinic::from))
    }

    /// 列出中心的所有诊所
    pub async fn list_clinics(&self, center_id: &Uuid) -> Result<Vec<Clinic>> {
        let results = sqlx::query_as::<_, DbClinic>(
            "SELECT * FROM clinics WHERE center_id = $1 ORDER BY clinic_number"
        )
        .bind(center_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Clinic::from).collect())
    }

    /// 更新诊所基础信息（计数器字段由队列引擎独占）
    pub async fn update_clinic(&self, clinic: &Clinic) -> Result<()> {
        sqlx::query(r#"
            UPDATE clinics
            SET name = $2, clinic_number = $3, screen_ids = $4, password = $5, updated_at = NOW()
            WHERE id = $1
        "#)
        .bind(clinic.id)
        .bind(&clinic.name)
        .bind(clinic.clinic_number)
        .bind(&clinic.screen_ids)
        .bind(&clinic.password)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    /// 删除诊所及其叫号记录
    pub async fn delete_clinic(&self, id: &Uuid) -> Result<()> {
        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM queue_calls WHERE clinic_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM clinics WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 医生相关操作 ==========

    /// 创建新医生
    pub async fn create_doctor(&self, doctor: &NewDoctor) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO doctors (id, center_id, doctor_number, name, phone, national_id,
                specialty, clinic_id, work_days, shift, annual_leave_balance,
                emergency_leave_balance, notes, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
        "#)
        .bind(doctor.id)
        .bind(doctor.center_id)
        .bind(&doctor.doctor_number)
        .bind(&doctor.name)
        .bind(&doctor.phone)
        .bind(&doctor.national_id)
        .bind(&doctor.specialty)
        .bind(doctor.clinic_id)
        .bind(&doctor.work_days)
        .bind(doctor.shift.as_str())
        .bind(doctor.annual_leave_balance)
        .bind(doctor.emergency_leave_balance)
        .bind(&doctor.notes)
        .bind(&doctor.photo_url)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 根据ID查找医生
    pub async fn get_doctor_by_id(&self, id: &Uuid) -> Result<Option<Doctor>> {
        let result = sqlx::query_as::<_, DbDoctor>(
            "SELECT * FROM doctors WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Doctor::from))
    }

    /// 按工号与国民身份证号查找医生（医生登录）
    pub async fn get_doctor_by_credentials(
        &self,
        doctor_number: &str,
        national_id: &str,
    ) -> Result<Option<Doctor>> {
        let result = sqlx::query_as::<_, DbDoctor>(
            "SELECT * FROM doctors WHERE doctor_number = $1 AND national_id = $2"
        )
        .bind(doctor_number)
        .bind(national_id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Doctor::from))
    }

    /// 列出中心的所有医生
    pub async fn list_doctors(&self, center_id: &Uuid) -> Result<Vec<Doctor>> {
        let results = sqlx::query_as::<_, DbDoctor>(
            "SELECT * FROM doctors WHERE center_id = $1 ORDER BY name"
        )
        .bind(center_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Doctor::from).collect())
    }

    /// 列出诊所的在岗医生
    pub async fn list_doctors_by_clinic(&self, clinic_id: &Uuid) -> Result<Vec<Doctor>> {
        let results = sqlx::query_as::<_, DbDoctor>(
            "SELECT * FROM doctors WHERE clinic_id = $1 AND work_status = 'active' ORDER BY name"
        )
        .bind(clinic_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Doctor::from).collect())
    }

    /// 更新医生在职状态
    pub async fn update_doctor_work_status(&self, id: &Uuid, status: &WorkStatus) -> Result<()> {
        sqlx::query(
            "UPDATE doctors SET work_status = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(status.as_str())
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    /// 扣减医生假期余额
    pub async fn deduct_leave_balance(
        &self,
        id: &Uuid,
        annual_days: i32,
        emergency_days: i32,
    ) -> Result<()> {
        sqlx::query(r#"
            UPDATE doctors
            SET annual_leave_balance = annual_leave_balance - $1,
                emergency_leave_balance = emergency_leave_balance - $2,
                updated_at = NOW()
            WHERE id = $3
        "#)
        .bind(annual_days)
        .bind(emergency_days)
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    /// 删除医生
    pub async fn delete_doctor(&self, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 患者相关操作 ==========

    /// 创建新患者档案
    pub async fn create_patient(&self, patient: &NewPatient) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO patients (id, center_id, full_name, national_id, phone, email, gender,
                family_members, chronic_diseases, is_pregnant, is_breastfeeding,
                previous_surgeries, drug_allergies, current_medications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
        "#)
        .bind(patient.id)
        .bind(patient.center_id)
        .bind(&patient.full_name)
        .bind(&patient.national_id)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(patient.gender.as_str())
        .bind(patient.family_members)
        .bind(&patient.chronic_diseases)
        .bind(patient.is_pregnant)
        .bind(patient.is_breastfeeding)
        .bind(&patient.previous_surgeries)
        .bind(&patient.drug_allergies)
        .bind(&patient.current_medications)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 按国民身份证号查找患者（患者登录）
    pub async fn get_patient_by_national_id(&self, national_id: &str) -> Result<Option<Patient>> {
        let result = sqlx::query_as::<_, DbPatient>(
            "SELECT * FROM patients WHERE national_id = $1"
        )
        .bind(national_id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Patient::from))
    }

    /// 根据ID查找患者
    pub async fn get_patient_by_id(&self, id: &Uuid) -> Result<Option<Patient>> {
        let result = sqlx::query_as::<_, DbPatient>(
            "SELECT * FROM patients WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Patient::from))
    }

    /// 按姓名搜索患者
    pub async fn search_patients_by_name(&self, name: &str, limit: i64) -> Result<Vec<Patient>> {
        let results = sqlx::query_as::<_, DbPatient>(
            "SELECT * FROM patients WHERE full_name ILIKE $1 ORDER BY updated_at DESC LIMIT $2"
        )
        .bind(format!("%{}%", name))
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Patient::from).collect())
    }

    // ========== 预约相关操作 ==========

    /// 创建新预约
    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO appointments (id, center_id, clinic_id, patient_name, national_id,
                phone, appointment_date, appointment_time, visit_reason, shift)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
        "#)
        .bind(appointment.id)
        .bind(appointment.center_id)
        .bind(appointment.clinic_id)
        .bind(&appointment.patient_name)
        .bind(&appointment.national_id)
        .bind(&appointment.phone)
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(&appointment.visit_reason)
        .bind(appointment.shift.as_str())
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 检查时段是否已被占用
    pub async fn slot_taken(
        &self,
        clinic_id: &Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool> {
        let row = sqlx::query(r#"
            SELECT COUNT(*) AS count FROM appointments
            WHERE clinic_id = $1 AND appointment_date = $2 AND appointment_time = $3
              AND status != 'cancelled'
        "#)
        .bind(clinic_id)
        .bind(date)
        .bind(time)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// 按诊所与日期列出预约
    pub async fn list_appointments(
        &self,
        clinic_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let results = sqlx::query_as::<_, DbAppointment>(r#"
            SELECT * FROM appointments
            WHERE clinic_id = $1 AND appointment_date = $2
            ORDER BY appointment_time
        "#)
        .bind(clinic_id)
        .bind(date)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Appointment::from).collect())
    }

    /// 按国民身份证号列出患者的预约
    pub async fn list_appointments_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Vec<Appointment>> {
        let results = sqlx::query_as::<_, DbAppointment>(r#"
            SELECT * FROM appointments
            WHERE national_id = $1
            ORDER BY appointment_date DESC, appointment_time DESC
        "#)
        .bind(national_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Appointment::from).collect())
    }

    /// 更新预约状态
    pub async fn update_appointment_status(
        &self,
        id: &Uuid,
        status: &AppointmentStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE appointments SET status = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(status.as_str())
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 问诊相关操作 ==========

    /// 创建新问诊
    pub async fn create_consultation(&self, consultation: &NewConsultation) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO consultations (id, patient_id, doctor_id, specialty_required,
                complaint_text, current_symptoms, weight_kg, height_cm, blood_pressure,
                temperature, pulse)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
        "#)
        .bind(consultation.id)
        .bind(consultation.patient_id)
        .bind(consultation.doctor_id)
        .bind(&consultation.specialty_required)
        .bind(&consultation.complaint_text)
        .bind(&consultation.current_symptoms)
        .bind(consultation.weight_kg)
        .bind(consultation.height_cm)
        .bind(&consultation.blood_pressure)
        .bind(consultation.temperature)
        .bind(consultation.pulse)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 根据ID查找问诊
    pub async fn get_consultation_by_id(&self, id: &Uuid) -> Result<Option<Consultation>> {
        let result = sqlx::query_as::<_, DbConsultation>(
            "SELECT * FROM consultations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(Consultation::from))
    }

    /// 列出医生待处理的问诊
    pub async fn list_open_consultations(&self, doctor_id: &Uuid) -> Result<Vec<Consultation>> {
        let results = sqlx::query_as::<_, DbConsultation>(r#"
            SELECT * FROM consultations
            WHERE doctor_id = $1 AND status = 'open'
            ORDER BY created_at
        "#)
        .bind(doctor_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Consultation::from).collect())
    }

    /// 列出患者的问诊历史
    pub async fn list_consultations_by_patient(
        &self,
        patient_id: &Uuid,
    ) -> Result<Vec<Consultation>> {
        let results = sqlx::query_as::<_, DbConsultation>(r#"
            SELECT * FROM consultations
            WHERE patient_id = $1
            ORDER BY created_at DESC
        "#)
        .bind(patient_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Consultation::from).collect())
    }

    /// 医生答复并关闭问诊
    pub async fn respond_consultation(&self, id: &Uuid, response_text: &str) -> Result<()> {
        sqlx::query(r#"
            UPDATE consultations
            SET response_text = $1, status = 'closed', updated_at = NOW()
            WHERE id = $2
        "#)
        .bind(response_text)
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 投诉相关操作 ==========

    /// 创建新投诉或建议
    pub async fn create_complaint(&self, complaint: &NewComplaint) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO complaints (id, center_id, patient_name, phone, email, kind, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#)
        .bind(complaint.id)
        .bind(complaint.center_id)
        .bind(&complaint.patient_name)
        .bind(&complaint.phone)
        .bind(&complaint.email)
        .bind(complaint.kind.as_str())
        .bind(&complaint.message)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 列出中心的投诉
    pub async fn list_complaints(&self, center_id: &Uuid) -> Result<Vec<Complaint>> {
        let results = sqlx::query_as::<_, DbComplaint>(
            "SELECT * FROM complaints WHERE center_id = $1 ORDER BY created_at DESC"
        )
        .bind(center_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Complaint::from).collect())
    }

    /// 更新投诉处理状态与备注
    pub async fn update_complaint(
        &self,
        id: &Uuid,
        status: &ComplaintStatus,
        notes: Option<&str>,
    ) -> Result<()> {
        sqlx::query(r#"
            UPDATE complaints
            SET status = $1, notes = COALESCE($2, notes), updated_at = NOW()
            WHERE id = $3
        "#)
        .bind(status.as_str())
        .bind(notes)
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 请假相关操作 ==========

    /// 创建新请假申请
    pub async fn create_leave_request(&self, request: &NewLeaveRequest) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO leave_requests (id, doctor_id, request_type, start_date, end_date,
                acting_doctor_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#)
        .bind(request.id)
        .bind(request.doctor_id)
        .bind(request.request_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.acting_doctor_id)
        .bind(&request.notes)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 根据ID查找请假申请
    pub async fn get_leave_request_by_id(&self, id: &Uuid) -> Result<Option<LeaveRequest>> {
        let result = sqlx::query_as::<_, DbLeaveRequest>(
            "SELECT * FROM leave_requests WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(LeaveRequest::from))
    }

    /// 列出医生的请假申请
    pub async fn list_leave_requests_by_doctor(
        &self,
        doctor_id: &Uuid,
    ) -> Result<Vec<LeaveRequest>> {
        let results = sqlx::query_as::<_, DbLeaveRequest>(
            "SELECT * FROM leave_requests WHERE doctor_id = $1 ORDER BY created_at DESC"
        )
        .bind(doctor_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(LeaveRequest::from).collect())
    }

    /// 列出所有待审批的请假申请
    pub async fn list_pending_leave_requests(&self) -> Result<Vec<LeaveRequest>> {
        let results = sqlx::query_as::<_, DbLeaveRequest>(
            "SELECT * FROM leave_requests WHERE status = 'pending' ORDER BY created_at"
        )
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(LeaveRequest::from).collect())
    }

    /// 更新请假审批状态
    pub async fn update_leave_request_status(
        &self,
        id: &Uuid,
        status: &RequestStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE leave_requests SET status = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(status.as_str())
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 考勤相关操作 ==========

    /// 医生签到（同日重复签到只保留首次时间）
    pub async fn check_in(&self, record: &NewAttendanceRecord) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO attendance_records (id, doctor_id, date, check_in_time, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (doctor_id, date) DO UPDATE
            SET check_in_time = COALESCE(attendance_records.check_in_time, EXCLUDED.check_in_time),
                updated_at = NOW()
            RETURNING id
        "#)
        .bind(record.id)
        .bind(record.doctor_id)
        .bind(record.date)
        .bind(record.check_in_time)
        .bind(record.status.as_str())
        .bind(&record.notes)
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 医生签退
    pub async fn check_out(
        &self,
        doctor_id: &Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<()> {
        sqlx::query(r#"
            UPDATE attendance_records
            SET check_out_time = $1, updated_at = NOW()
            WHERE doctor_id = $2 AND date = $3
        "#)
        .bind(time)
        .bind(doctor_id)
        .bind(date)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    /// 列出医生在日期区间内的考勤
    pub async fn list_attendance(
        &self,
        doctor_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let results = sqlx::query_as::<_, DbAttendanceRecord>(r#"
            SELECT * FROM attendance_records
            WHERE doctor_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date DESC
        "#)
        .bind(doctor_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(AttendanceRecord::from).collect())
    }

    // ========== 管理员相关操作 ==========

    /// 创建新管理员
    pub async fn create_admin_user(&self, user: &NewAdminUser) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO admin_users (id, center_id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#)
        .bind(user.id)
        .bind(user.center_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 按邮箱查找管理员（登录）
    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let result = sqlx::query_as::<_, DbAdminUser>(
            "SELECT * FROM admin_users WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(result.map(AdminUser::from))
    }

    /// 记录管理员最近登录时间
    pub async fn touch_admin_login(&self, id: &Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE admin_users SET last_login = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 通知相关操作 ==========

    /// 创建新通知
    pub async fn create_notification(&self, notification: &NewNotification) -> Result<Uuid> {
        sqlx::query(r#"
            INSERT INTO notifications (id, recipient_id, recipient_type, title, message, kind)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#)
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.recipient_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .fetch_one(self.pool.pool())
        .await
        .map(|row| row.get("id"))
        .map_err(|e| QmsError::Database(e.to_string()))
    }

    /// 列出接收方的通知
    pub async fn list_notifications(&self, recipient_id: &Uuid) -> Result<Vec<Notification>> {
        let results = sqlx::query_as::<_, DbNotification>(
            "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC"
        )
        .bind(recipient_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Notification::from).collect())
    }

    /// 标记通知为已读
    pub async fn mark_notification_read(&self, id: &Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE notifications SET is_read = TRUE, updated_at = NOW() WHERE id = $1"
        )
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== 叫号记录查询 ==========

    /// 列出诊所最近的叫号记录
    pub async fn list_recent_calls(&self, clinic_id: &Uuid, limit: i64) -> Result<Vec<QueueCall>> {
        let results = sqlx::query_as::<_, DbQueueCall>(r#"
            SELECT * FROM queue_calls
            WHERE clinic_id = $1
            ORDER BY called_at DESC
            LIMIT $2
        "#)
        .bind(clinic_id)
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| QmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(QueueCall::from).collect())
    }
}
