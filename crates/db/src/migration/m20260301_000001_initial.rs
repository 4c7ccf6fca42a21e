//! Initial database migration.
//!
//! Creates every leave-management table, the PostgreSQL enums and the
//! constraints that back the ledger invariants.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ORGANIZATIONS & PROFILES
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL GROUPS
        // ============================================================
        db.execute_unprepared(GROUPS_SQL).await?;

        // ============================================================
        // PART 4: LEAVE REQUESTS
        // ============================================================
        db.execute_unprepared(LEAVES_SQL).await?;

        // ============================================================
        // PART 5: COMP-OFF GRANTS
        // ============================================================
        db.execute_unprepared(COMP_OFFS_SQL).await?;

        // ============================================================
        // PART 6: SETTINGS, ARCHIVES & HOLIDAYS
        // ============================================================
        db.execute_unprepared(LEAVE_SETTINGS_SQL).await?;
        db.execute_unprepared(LEAVE_ARCHIVES_SQL).await?;
        db.execute_unprepared(PUBLIC_HOLIDAYS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM (
    'USER',
    'TEAM_LEAD',
    'HR',
    'ADMIN',
    'SUPER_ADMIN',
    'CEO'
);

CREATE TYPE leave_type AS ENUM ('CASUAL', 'MEDICAL', 'COMP_OFF');

CREATE TYPE leave_status AS ENUM ('PENDING', 'APPROVED', 'REJECTED', 'CANCELLED');

CREATE TYPE half_day_slot AS ENUM ('MORNING', 'AFTERNOON');

CREATE TYPE holiday_type AS ENUM ('MANDATORY', 'OPTIONAL', 'NORMAL');
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    domain VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_organizations_name ON organizations(name);
";

const USERS_SQL: &str = r"
-- id is the identity provider's subject; profiles are registered by an admin
CREATE TABLE users (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255),
    designation VARCHAR(255),
    role user_role NOT NULL DEFAULT 'USER',
    balance_casual NUMERIC(6, 1) NOT NULL DEFAULT 0,
    balance_medical NUMERIC(6, 1) NOT NULL DEFAULT 0,
    -- cached; recomputed from user_comp_offs on every grant change
    balance_compoff NUMERIC(6, 1) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_balance_casual_non_negative CHECK (balance_casual >= 0),
    CONSTRAINT chk_balance_medical_non_negative CHECK (balance_medical >= 0),
    CONSTRAINT chk_balance_compoff_non_negative CHECK (balance_compoff >= 0)
);

CREATE INDEX idx_users_organization ON users(organization_id, created_at DESC);
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_groups_org_name UNIQUE (organization_id, name)
);

CREATE TABLE group_members (
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (group_id, user_id)
);

CREATE INDEX idx_group_members_user ON group_members(user_id, created_at);
";

const LEAVES_SQL: &str = r"
CREATE TABLE leaves (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id),
    organization_id UUID NOT NULL REFERENCES organizations(id),
    leave_type leave_type NOT NULL,
    status leave_status NOT NULL DEFAULT 'PENDING',
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_half_day BOOLEAN NOT NULL DEFAULT false,
    half_day_slot half_day_slot,
    days_count NUMERIC(6, 1) NOT NULL,
    ledger_days NUMERIC(6, 1) NOT NULL DEFAULT 0,
    reason TEXT NOT NULL,
    assigned_group_id UUID REFERENCES groups(id) ON DELETE SET NULL,
    rejection_reason TEXT,
    decided_by UUID REFERENCES users(id),
    decided_at TIMESTAMPTZ,
    is_archived BOOLEAN NOT NULL DEFAULT false,
    archived_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_leave_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_leave_days_positive CHECK (days_count > 0),
    CONSTRAINT chk_leave_ledger_days CHECK (ledger_days >= 0 AND ledger_days <= days_count),
    CONSTRAINT chk_half_day_single_date CHECK (NOT is_half_day OR (start_date = end_date AND half_day_slot IS NOT NULL)),
    CONSTRAINT chk_archived_at CHECK (is_archived = (archived_at IS NOT NULL))
);

CREATE INDEX idx_leaves_user ON leaves(user_id, created_at DESC);
CREATE INDEX idx_leaves_pending_group ON leaves(assigned_group_id, created_at)
    WHERE status = 'PENDING' AND NOT is_archived;
CREATE INDEX idx_leaves_org_status ON leaves(organization_id, status, created_at);
CREATE INDEX idx_leaves_user_start ON leaves(user_id, start_date);
";

const COMP_OFFS_SQL: &str = r"
CREATE TABLE comp_offs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id),
    title VARCHAR(255) NOT NULL,
    description TEXT,
    work_date DATE,
    days NUMERIC(6, 1) NOT NULL DEFAULT 1,
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_comp_off_days_positive CHECK (days > 0)
);

CREATE TABLE user_comp_offs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    comp_off_id UUID NOT NULL REFERENCES comp_offs(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    consumed_days NUMERIC(6, 1) NOT NULL DEFAULT 0,
    is_consumed BOOLEAN NOT NULL DEFAULT false,
    forfeited_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_user_comp_offs UNIQUE (comp_off_id, user_id),
    CONSTRAINT chk_consumed_days_non_negative CHECK (consumed_days >= 0)
);

CREATE INDEX idx_user_comp_offs_available ON user_comp_offs(user_id, created_at)
    WHERE NOT is_consumed;

CREATE TABLE comp_off_consumptions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    leave_id UUID NOT NULL REFERENCES leaves(id) ON DELETE CASCADE,
    user_comp_off_id UUID NOT NULL REFERENCES user_comp_offs(id) ON DELETE RESTRICT,
    days NUMERIC(6, 1) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_consumption_days_positive CHECK (days > 0)
);

CREATE INDEX idx_comp_off_consumptions_leave ON comp_off_consumptions(leave_id);
";

const LEAVE_SETTINGS_SQL: &str = r"
CREATE TABLE leave_settings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL UNIQUE REFERENCES organizations(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    default_casual_leaves NUMERIC(6, 1) NOT NULL DEFAULT 12,
    default_medical_leaves NUMERIC(6, 1) NOT NULL DEFAULT 12,
    carry_forward_enabled BOOLEAN NOT NULL DEFAULT false,
    -- informational; archive rows are the settlement gate
    year_end_processed BOOLEAN NOT NULL DEFAULT false,
    year_end_processed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_default_casual_non_negative CHECK (default_casual_leaves >= 0),
    CONSTRAINT chk_default_medical_non_negative CHECK (default_medical_leaves >= 0)
);
";

const LEAVE_ARCHIVES_SQL: &str = r"
CREATE TABLE leave_archives (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    total_requests INTEGER NOT NULL DEFAULT 0,
    approved_count INTEGER NOT NULL DEFAULT 0,
    pending_count INTEGER NOT NULL DEFAULT 0,
    rejected_count INTEGER NOT NULL DEFAULT 0,
    cancelled_count INTEGER NOT NULL DEFAULT 0,
    casual_taken NUMERIC(6, 1) NOT NULL DEFAULT 0,
    medical_taken NUMERIC(6, 1) NOT NULL DEFAULT 0,
    comp_off_taken NUMERIC(6, 1) NOT NULL DEFAULT 0,
    closing_casual NUMERIC(6, 1) NOT NULL DEFAULT 0,
    closing_medical NUMERIC(6, 1) NOT NULL DEFAULT 0,
    closing_comp_off NUMERIC(6, 1) NOT NULL DEFAULT 0,
    carried_forward_casual NUMERIC(6, 1) NOT NULL DEFAULT 0,
    forfeited_comp_off NUMERIC(6, 1) NOT NULL DEFAULT 0,
    new_casual NUMERIC(6, 1) NOT NULL DEFAULT 0,
    new_medical NUMERIC(6, 1) NOT NULL DEFAULT 0,
    archived_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_leave_archives_user_org_year UNIQUE (user_id, organization_id, year)
);

CREATE INDEX idx_leave_archives_org_year ON leave_archives(organization_id, year);
";

const PUBLIC_HOLIDAYS_SQL: &str = r"
CREATE TABLE public_holidays (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    date DATE NOT NULL,
    year INTEGER NOT NULL,
    holiday_type holiday_type NOT NULL DEFAULT 'NORMAL',
    description TEXT,
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_holiday_year CHECK (year = EXTRACT(YEAR FROM date)::INTEGER)
);

CREATE INDEX idx_public_holidays_org_year ON public_holidays(organization_id, year, date);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS public_holidays CASCADE;
DROP TABLE IF EXISTS leave_archives CASCADE;
DROP TABLE IF EXISTS leave_settings CASCADE;
DROP TABLE IF EXISTS comp_off_consumptions CASCADE;
DROP TABLE IF EXISTS user_comp_offs CASCADE;
DROP TABLE IF EXISTS comp_offs CASCADE;
DROP TABLE IF EXISTS leaves CASCADE;
DROP TABLE IF EXISTS group_members CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;

DROP TYPE IF EXISTS holiday_type;
DROP TYPE IF EXISTS half_day_slot;
DROP TYPE IF EXISTS leave_status;
DROP TYPE IF EXISTS leave_type;
DROP TYPE IF EXISTS user_role;
";
