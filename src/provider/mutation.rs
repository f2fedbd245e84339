use async_trait::async_trait;
use serde_json::Value;

use crate::dataplane::{ApiError, DataPlaneClient, Transaction};
use crate::resource::Locator;
use crate::transaction::UnitOfWork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

/// 이름 있는 리소스 하나에 대한 변경을 트랜잭션 작업으로 표현합니다.
#[derive(Debug, Clone)]
pub struct ResourceMutation {
    pub locator: Locator,
    pub mutation: Mutation,
    pub payload: Value,
}

impl ResourceMutation {
    pub fn create(locator: Locator, payload: Value) -> Self {
        Self {
            locator,
            mutation: Mutation::Create,
            payload,
        }
    }

    pub fn update(locator: Locator, payload: Value) -> Self {
        Self {
            locator,
            mutation: Mutation::Update,
            payload,
        }
    }

    pub fn delete(locator: Locator) -> Self {
        Self {
            locator,
            mutation: Mutation::Delete,
            payload: Value::Null,
        }
    }
}

#[async_trait]
impl UnitOfWork for ResourceMutation {
    type Output = ();
    type Error = ApiError;

    fn name(&self) -> String {
        let verb = match self.mutation {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        };
        format!("{} {}", verb, self.locator)
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<(), ApiError> {
        match self.mutation {
            Mutation::Create => client.create(&self.locator, transaction, &self.payload).await,
            Mutation::Update => client.update(&self.locator, transaction, &self.payload).await,
            Mutation::Delete => client.delete(&self.locator, transaction).await,
        }
    }
}
