use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthIdentities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthIdentities::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthIdentities::Provider)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthIdentities::EntityId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthIdentities::ActorType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthIdentities::ActorId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthIdentities::Metadata).text())
                    .col(
                        ColumnDef::new(AuthIdentities::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AuthIdentities::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一提供商下外部标识唯一，并发创建时由存储层裁决
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_identities_provider_entity_id")
                    .table(AuthIdentities::Table)
                    .col(AuthIdentities::Provider)
                    .col(AuthIdentities::EntityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_identities_actor")
                    .table(AuthIdentities::Table)
                    .col(AuthIdentities::ActorType)
                    .col(AuthIdentities::ActorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthIdentities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthIdentities {
    Table,
    Id,
    Provider,
    EntityId,
    ActorType,
    ActorId,
    Metadata,
    CreatedAt,
    UpdatedAt,
}
