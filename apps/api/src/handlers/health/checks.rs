use redis::AsyncCommands;

use super::HealthDependencyStatus;

fn ok() -> HealthDependencyStatus {
    HealthDependencyStatus {
        status: "ok",
        detail: None,
    }
}

fn failed(detail: String) -> HealthDependencyStatus {
    HealthDependencyStatus {
        status: "error",
        detail: Some(detail),
    }
}

pub(super) async fn check_postgres(pool: sqlx::PgPool) -> HealthDependencyStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => ok(),
        Err(error) => failed(format!("postgres check failed: {error}")),
    }
}

pub(super) async fn check_redis(
    redis_client: Option<redis::Client>,
    redis_required: bool,
) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        return if redis_required {
            failed("redis client is not configured".to_owned())
        } else {
            HealthDependencyStatus {
                status: "disabled",
                detail: None,
            }
        };
    };

    let mut connection = match redis_client.get_multiplexed_async_connection().await {
        Ok(connection) => connection,
        Err(error) => return failed(format!("redis connection failed: {error}")),
    };

    match connection.ping::<String>().await {
        Ok(value) if value.eq_ignore_ascii_case("pong") => ok(),
        Ok(value) => failed(format!("unexpected redis ping response: {value}")),
        Err(error) => failed(format!("redis ping failed: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::check_redis;

    #[tokio::test]
    async fn missing_redis_client_is_disabled_unless_required() {
        assert_eq!(check_redis(None, false).await.status, "disabled");

        let required = check_redis(None, true).await;
        assert_eq!(required.status, "error");
        assert!(required.detail.is_some());
    }
}
