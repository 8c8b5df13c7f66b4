use loyalty_engine::{
    db_types::{Balance, NewOrder, NewUserAccount, NewWithdrawal, Order, OrderNumber, Points, UserAccount, Withdrawal},
    traits::{
        AuthApiError,
        BalanceManagement,
        InsertOrderResult,
        LedgerError,
        OrderFlowError,
        OrderManagement,
        UserManagement,
    },
};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderFlowError>;
        async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
    }
}

mock! {
    pub BalanceManager {}
    impl BalanceManagement for BalanceManager {
        async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError>;
        async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, LedgerError>;
        async fn debit_balance(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
        async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
    }
}

mock! {
    pub UserManager {}
    impl UserManagement for UserManager {
        async fn create_user(&self, user: NewUserAccount) -> Result<UserAccount, AuthApiError>;
        async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AuthApiError>;
    }
}
