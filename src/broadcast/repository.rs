use diesel::BoolExpressionMethods;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;

use crate::integration::db;
use crate::model::Pagination;
use crate::schema::{broadcast_receipts, broadcasts};
use crate::user;

use super::Id;
use super::model::{Broadcast, NewBroadcast, NewReceipt, Receipt};

pub trait BroadcastRepository {
    fn insert(&self, b: &NewBroadcast, recipients: &[user::Id]) -> super::Result<Broadcast>;

    fn find_inbox(
        &self,
        recipient: &user::Id,
        p: &Pagination,
    ) -> super::Result<(Vec<(Broadcast, Receipt)>, i64)>;

    fn find_receipts(&self, id: &Id) -> super::Result<Vec<Receipt>>;

    fn count_unread(&self, recipient: &user::Id) -> super::Result<i64>;

    fn mark_read(&self, recipient: &user::Id, id: &Id) -> super::Result<bool>;
}

pub struct SqliteBroadcastRepository {
    pool: db::Pool,
}

impl SqliteBroadcastRepository {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }
}

impl BroadcastRepository for SqliteBroadcastRepository {
    fn insert(&self, b: &NewBroadcast, recipients: &[user::Id]) -> super::Result<Broadcast> {
        let mut conn = self.pool.get()?;

        conn.immediate_transaction::<_, super::Error, _>(|conn| {
            let broadcast = diesel::insert_into(broadcasts::table)
                .values(b)
                .returning(Broadcast::as_returning())
                .get_result(conn)?;

            for recipient in recipients {
                diesel::insert_into(broadcast_receipts::table)
                    .values(&NewReceipt::new(broadcast.id(), *recipient))
                    .execute(conn)?;
            }

            Ok(broadcast)
        })
    }

    fn find_inbox(
        &self,
        recipient: &user::Id,
        p: &Pagination,
    ) -> super::Result<(Vec<(Broadcast, Receipt)>, i64)> {
        let mut conn = self.pool.get()?;

        let total = broadcast_receipts::table
            .filter(broadcast_receipts::recipient_id.eq(recipient))
            .count()
            .get_result::<i64>(&mut conn)?;

        let items = broadcast_receipts::table
            .inner_join(broadcasts::table)
            .filter(broadcast_receipts::recipient_id.eq(recipient))
            .order((broadcasts::created_at.desc(), broadcasts::id.desc()))
            .limit(p.limit())
            .offset(p.offset())
            .select((Broadcast::as_select(), Receipt::as_select()))
            .load::<(Broadcast, Receipt)>(&mut conn)?;

        Ok((items, total))
    }

    fn find_receipts(&self, id: &Id) -> super::Result<Vec<Receipt>> {
        let mut conn = self.pool.get()?;

        let receipts = broadcast_receipts::table
            .filter(broadcast_receipts::broadcast_id.eq(id))
            .order(broadcast_receipts::recipient_id.asc())
            .select(Receipt::as_select())
            .load(&mut conn)?;

        Ok(receipts)
    }

    fn count_unread(&self, recipient: &user::Id) -> super::Result<i64> {
        let mut conn = self.pool.get()?;

        let count = broadcast_receipts::table
            .filter(
                broadcast_receipts::recipient_id
                    .eq(recipient)
                    .and(broadcast_receipts::is_read.eq(false)),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    fn mark_read(&self, recipient: &user::Id, id: &Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        conn.immediate_transaction::<_, super::Error, _>(|conn| {
            let receipt = broadcast_receipts::table
                .filter(
                    broadcast_receipts::broadcast_id
                        .eq(id)
                        .and(broadcast_receipts::recipient_id.eq(recipient)),
                )
                .select(Receipt::as_select())
                .first(conn)
                .optional()?
                .ok_or(super::Error::NotFound(*id))?;

            if receipt.is_read() {
                return Ok(false);
            }

            diesel::update(broadcast_receipts::table.find(receipt.id()))
                .set((
                    broadcast_receipts::is_read.eq(true),
                    broadcast_receipts::read_at.eq(chrono::Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            Ok(true)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::broadcast::Error;
    use crate::integration::db::tests::{file_pool, pool, seed_user};
    use crate::user::Role;

    #[test]
    fn should_insert_broadcast_with_receipts() {
        let pool = pool();
        let repo = SqliteBroadcastRepository::new(pool.clone());
        let admin = seed_user(&pool, "admin", Role::Admin);
        let t1 = seed_user(&pool, "t1", Role::Teacher);
        let t2 = seed_user(&pool, "t2", Role::Teacher);

        let b = repo
            .insert(&NewBroadcast::new(Some(admin), "Staff meeting").unwrap(), &[t1, t2])
            .unwrap();
        let receipts = repo.find_receipts(&b.id()).unwrap();

        assert_eq!(b.sender_id(), Some(admin));
        assert_eq!(receipts.len(), 2);
        assert!(receipts.iter().all(|r| !r.is_read() && r.read_at().is_none()));
        assert_eq!(receipts[0].recipient_id(), t1);
    }

    #[test]
    fn should_roll_back_fan_out_on_failure() {
        let pool = pool();
        let repo = SqliteBroadcastRepository::new(pool.clone());
        let t1 = seed_user(&pool, "t1", Role::Teacher);

        let res = repo.insert(
            &NewBroadcast::new(None, "Maintenance tonight").unwrap(),
            &[t1, user::Id(9999)],
        );

        assert!(matches!(res, Err(Error::_Diesel(_))));
        let mut conn = pool.get().unwrap();
        let broadcasts = broadcasts::table
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        let receipts = broadcast_receipts::table
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!((broadcasts, receipts), (0, 0));
    }

    #[test]
    fn should_mark_read_once() {
        let pool = pool();
        let repo = SqliteBroadcastRepository::new(pool.clone());
        let t1 = seed_user(&pool, "t1", Role::Teacher);
        let b = repo
            .insert(&NewBroadcast::new(None, "Hello").unwrap(), &[t1])
            .unwrap();

        assert_eq!(repo.count_unread(&t1).unwrap(), 1);
        assert!(repo.mark_read(&t1, &b.id()).unwrap());
        let first_read_at = repo.find_receipts(&b.id()).unwrap()[0].read_at();
        assert!(!repo.mark_read(&t1, &b.id()).unwrap());

        assert_eq!(repo.count_unread(&t1).unwrap(), 0);
        assert!(first_read_at.is_some());
        assert_eq!(repo.find_receipts(&b.id()).unwrap()[0].read_at(), first_read_at);
    }

    #[test]
    fn should_not_mark_foreign_receipt() {
        let pool = pool();
        let repo = SqliteBroadcastRepository::new(pool.clone());
        let t1 = seed_user(&pool, "t1", Role::Teacher);
        let t2 = seed_user(&pool, "t2", Role::Teacher);
        let b = repo
            .insert(&NewBroadcast::new(None, "Hello").unwrap(), &[t1])
            .unwrap();

        assert!(matches!(repo.mark_read(&t2, &b.id()), Err(Error::NotFound(_))));
        assert!(matches!(repo.mark_read(&t1, &Id(404)), Err(Error::NotFound(_))));
    }

    #[test]
    fn should_page_inbox_newest_first() {
        let pool = pool();
        let repo = SqliteBroadcastRepository::new(pool.clone());
        let t1 = seed_user(&pool, "t1", Role::Teacher);
        let ids = (0..3)
            .map(|i| {
                repo.insert(&NewBroadcast::new(None, &format!("news {i}")).unwrap(), &[t1])
                    .unwrap()
                    .id()
            })
            .collect::<Vec<_>>();

        let (items, total) = repo.find_inbox(&t1, &Pagination::new(1, 2).unwrap()).unwrap();

        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0.id(), ids[2]);
        assert_eq!(items[1].0.id(), ids[1]);
    }

    #[test]
    fn should_mark_read_from_concurrent_recipients() {
        let db = file_pool("concurrent-receipts", 8);
        let repo = SqliteBroadcastRepository::new(db.pool.clone());
        let teachers = (0..8)
            .map(|i| seed_user(&db.pool, &format!("t{i}"), Role::Teacher))
            .collect::<Vec<_>>();
        let ids = (0..5)
            .map(|n| {
                let content = format!("notice {n}");
                let b = NewBroadcast::new(None, &content).unwrap();
                repo.insert(&b, &teachers).unwrap().id()
            })
            .collect::<Vec<_>>();

        let workers = teachers
            .iter()
            .map(|&teacher| {
                let repo = SqliteBroadcastRepository::new(db.pool.clone());
                let ids = ids.clone();
                std::thread::spawn(move || {
                    for id in &ids {
                        assert!(repo.mark_read(&teacher, id).unwrap());
                    }
                })
            })
            .collect::<Vec<_>>();
        for w in workers {
            w.join().unwrap();
        }

        for t in &teachers {
            assert_eq!(repo.count_unread(t).unwrap(), 0);
        }
    }
}
